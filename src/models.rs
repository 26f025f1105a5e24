//! Input and output records for review page generation.

use serde::Deserialize;

/// One gold/eval comparison to review.
///
/// `alignment` is a precomputed score or annotation produced upstream; it is
/// carried through for display and never interpreted here.
#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonEntry {
    /// `s3://bucket/key` location of the source PDF.
    pub s3_path: String,
    /// 1-based page number within the PDF.
    pub page: u32,
    /// Trusted reference transcription.
    pub gold_text: String,
    /// Candidate transcription under evaluation.
    pub eval_text: String,
    #[serde(default)]
    pub alignment: serde_json::Value,
}

/// A fully processed entry, ready for the review template.
///
/// `left_class` and `right_class` record which physical side holds which
/// content; `gold_class`/`eval_class` are always the complementary pair
/// `{"gold","eval"}` so client-side styling can reveal placement.
#[derive(Debug, Clone)]
pub struct RenderedEntry {
    /// Index of the entry in the input list.
    pub entry_id: usize,
    pub s3_path: String,
    pub page: u32,
    /// Base64-encoded PNG of the rendered page.
    pub page_image: String,
    /// Time-limited link to the original PDF.
    pub signed_pdf_link: String,
    /// Paragraph-wrapped HTML for the left panel.
    pub left_text: String,
    /// Paragraph-wrapped HTML for the right panel.
    pub right_text: String,
    pub left_alignment: String,
    pub right_alignment: String,
    pub left_class: &'static str,
    pub right_class: &'static str,
    pub gold_class: &'static str,
    pub eval_class: &'static str,
}

/// Format an opaque alignment value for display.
///
/// JSON strings render without surrounding quotes; anything else renders as
/// compact JSON. A missing alignment renders as the empty string.
pub fn display_alignment(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
