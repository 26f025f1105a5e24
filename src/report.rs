//! Review page generation.
//!
//! [`process_entry`] turns one [`ComparisonEntry`] into a [`RenderedEntry`]:
//! it randomizes which side shows the gold text, wraps both texts in
//! paragraph markup, signs a download link for the original PDF, and renders
//! the target page to an embedded image. [`ReportBuilder`] fans that out
//! across a bounded set of workers and writes the assembled HTML page.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use askama::Template;
use tokio::sync::mpsc;

use crate::models::{display_alignment, ComparisonEntry, RenderedEntry};
use crate::render::RenderPage;
use crate::storage::{ObjectStore, S3Uri};

/// Default lifetime of signed PDF links: 7 days, the S3 presigning maximum.
pub const SIGNED_LINK_EXPIRY_SECS: u64 = 604_800;

/// Longest edge of the embedded page image, in pixels.
pub const PAGE_IMAGE_MAX_DIM: u32 = 1024;

/// Events emitted while building a report.
#[derive(Debug, Clone)]
pub enum ReportEvent {
    /// Processing started for an entry.
    EntryStarted { entry_id: usize },
    /// An entry was fully processed.
    EntryCompleted { entry_id: usize },
}

/// Escape HTML special characters for safe interpolation.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert newline-delimited plain text into a sequence of `<p>` elements.
pub fn paragraphs(text: &str) -> String {
    let segments: Vec<String> = text.split('\n').map(escape_html).collect();
    format!("<p>{}</p>", segments.join("</p><p>"))
}

/// Process one comparison entry into a rendered entry.
///
/// `gold_on_left` decides side placement; the builder flips a fair coin, and
/// tests pass it explicitly to pin down a branch. Any storage or rendering
/// failure propagates to the caller and aborts the run.
pub async fn process_entry(
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn RenderPage>,
    entry_id: usize,
    entry: ComparisonEntry,
    gold_on_left: bool,
    link_expiry: Duration,
) -> anyhow::Result<RenderedEntry> {
    let (left_text, right_text, left_class, right_class) = if gold_on_left {
        (&entry.gold_text, &entry.eval_text, "gold", "eval")
    } else {
        (&entry.eval_text, &entry.gold_text, "eval", "gold")
    };

    let left_text = paragraphs(left_text);
    let right_text = paragraphs(right_text);

    // The alignment annotation is not side-specific upstream; both panels
    // carry the same value.
    let alignment = display_alignment(&entry.alignment);

    let uri: S3Uri = entry.s3_path.parse()?;
    let signed_pdf_link = store.presign_get(&uri, link_expiry).await?;

    let tmp_pdf = tempfile::Builder::new()
        .prefix("pagereview-")
        .suffix(".pdf")
        .tempfile()
        .context("creating temporary PDF file")?;
    store.download_to_path(&uri, tmp_pdf.path()).await?;

    let pdf_path = tmp_pdf.path().to_path_buf();
    let page = entry.page;
    let renderer = renderer.clone();
    let page_image = tokio::task::spawn_blocking(move || {
        renderer.render_base64_png(&pdf_path, page, PAGE_IMAGE_MAX_DIM)
    })
    .await?
    .with_context(|| format!("rendering page {} of {}", entry.page, uri))?;

    // tmp_pdf drops here, removing the downloaded file.

    Ok(RenderedEntry {
        entry_id,
        s3_path: entry.s3_path,
        page: entry.page,
        page_image,
        signed_pdf_link,
        left_text,
        right_text,
        left_alignment: alignment.clone(),
        right_alignment: alignment,
        left_class,
        right_class,
        gold_class: left_class,
        eval_class: right_class,
    })
}

/// Configuration for report generation.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Maximum number of entries processed in parallel.
    pub workers: usize,
    /// Lifetime of signed PDF links.
    pub link_expiry: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            link_expiry: Duration::from_secs(SIGNED_LINK_EXPIRY_SECS),
        }
    }
}

/// Builds a review page from comparison entries.
pub struct ReportBuilder {
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn RenderPage>,
    config: ReportConfig,
}

impl ReportBuilder {
    /// Create a builder with injected storage and rendering collaborators.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        renderer: Arc<dyn RenderPage>,
        config: ReportConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            config,
        }
    }

    /// Process all entries concurrently.
    ///
    /// One task per entry, at most `workers` in flight. Results come back in
    /// input order regardless of completion order; the first failure aborts
    /// the whole run.
    pub async fn render_entries(
        &self,
        entries: Vec<ComparisonEntry>,
        event_tx: mpsc::Sender<ReportEvent>,
    ) -> anyhow::Result<Vec<RenderedEntry>> {
        let workers = self.config.workers.max(1);
        let mut handles = Vec::with_capacity(workers);
        let mut rendered = Vec::with_capacity(entries.len());

        for (entry_id, entry) in entries.into_iter().enumerate() {
            let store = self.store.clone();
            let renderer = self.renderer.clone();
            let link_expiry = self.config.link_expiry;
            let event_tx = event_tx.clone();
            let gold_on_left = rand::random::<bool>();

            let handle = tokio::spawn(async move {
                let _ = event_tx.send(ReportEvent::EntryStarted { entry_id }).await;
                let result =
                    process_entry(store, renderer, entry_id, entry, gold_on_left, link_expiry)
                        .await;
                if result.is_ok() {
                    let _ = event_tx
                        .send(ReportEvent::EntryCompleted { entry_id })
                        .await;
                }
                result
            });
            handles.push(handle);

            if handles.len() >= workers {
                for h in handles.drain(..) {
                    rendered.push(h.await??);
                }
            }
        }

        for h in handles {
            rendered.push(h.await??);
        }

        rendered.sort_by_key(|e| e.entry_id);
        Ok(rendered)
    }

    /// Render all entries into the final HTML document.
    pub async fn build_html(
        &self,
        entries: Vec<ComparisonEntry>,
        event_tx: mpsc::Sender<ReportEvent>,
    ) -> anyhow::Result<String> {
        let rendered = self.render_entries(entries, event_tx).await?;
        let template = ReviewTemplate { entries: &rendered };
        template.render().context("rendering review template")
    }

    /// Build the review page and write it to `output`, overwriting any
    /// existing file.
    pub async fn write_report(
        &self,
        entries: Vec<ComparisonEntry>,
        output: &Path,
        event_tx: mpsc::Sender<ReportEvent>,
    ) -> anyhow::Result<()> {
        let html = self.build_html(entries, event_tx).await?;
        std::fs::write(output, html)
            .with_context(|| format!("writing report to {}", output.display()))?;
        tracing::info!("wrote review page to {}", output.display());
        Ok(())
    }
}

/// The review page.
#[derive(Template)]
#[template(path = "review.html")]
struct ReviewTemplate<'a> {
    entries: &'a [RenderedEntry],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_two_lines() {
        assert_eq!(paragraphs("line1\nline2"), "<p>line1</p><p>line2</p>");
    }

    #[test]
    fn test_paragraphs_single_line() {
        assert_eq!(paragraphs("only"), "<p>only</p>");
    }

    #[test]
    fn test_paragraphs_empty() {
        assert_eq!(paragraphs(""), "<p></p>");
    }

    #[test]
    fn test_paragraphs_escapes_markup() {
        assert_eq!(
            paragraphs("a & b\n<tag>"),
            "<p>a &amp; b</p><p>&lt;tag&gt;</p>"
        );
    }

    #[test]
    fn test_escape_html_quotes() {
        assert_eq!(escape_html("\"x\""), "&quot;x&quot;");
    }

    #[test]
    fn test_report_config_default_workers_positive() {
        assert!(ReportConfig::default().workers >= 1);
        assert_eq!(
            ReportConfig::default().link_expiry,
            Duration::from_secs(604_800)
        );
    }
}
