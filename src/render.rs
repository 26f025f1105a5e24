//! PDF page rendering via poppler's pdftoppm.
//!
//! The report only needs one capability from the rasterizer: turn a page of a
//! local PDF into a base64 PNG whose longest edge is capped. The [`RenderPage`]
//! trait keeps that boundary substitutable in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use base64::Engine;
use tempfile::TempDir;
use thiserror::Error;

/// Errors that can occur while rendering a page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("rendering failed: {0}")]
    RenderFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render a single PDF page to a base64-encoded PNG.
pub trait RenderPage: Send + Sync {
    /// Render `page` (1-based) of the PDF at `pdf_path`, scaled so the longest
    /// edge is `max_dim` pixels.
    fn render_base64_png(
        &self,
        pdf_path: &Path,
        page: u32,
        max_dim: u32,
    ) -> Result<String, RenderError>;
}

/// Check command status, returning appropriate error on failure.
fn check_cmd_status(
    result: std::io::Result<std::process::ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), RenderError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(RenderError::RenderFailed(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RenderError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(RenderError::Io(e)),
    }
}

/// Find the image pdftoppm produced for a page.
///
/// pdftoppm pads the page number in the output name to the digit count of the
/// document's last page (`page-1.png`, `page-07.png`, `page-012.png`, ...), so
/// probe the plausible widths.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    for digits in 1..=4 {
        let filename = format!("page-{:0width$}.png", page, width = digits);
        let path = dir.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Page renderer that shells out to pdftoppm.
#[derive(Debug, Default)]
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderPage for PdftoppmRenderer {
    fn render_base64_png(
        &self,
        pdf_path: &Path,
        page: u32,
        max_dim: u32,
    ) -> Result<String, RenderError> {
        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");

        // -scale-to caps the longest edge at max_dim pixels.
        let page_str = page.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-f", &page_str, "-l", &page_str])
            .args(["-scale-to", &max_dim.to_string()])
            .arg(pdf_path)
            .arg(&output_prefix)
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            &format!("pdftoppm failed to render page {}", page),
        )?;

        let image_path = find_page_image(temp_dir.path(), page).ok_or_else(|| {
            RenderError::RenderFailed(format!("no image generated for page {}", page))
        })?;

        let png = std::fs::read(&image_path)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }
}

/// Report availability of the external tools the renderer needs.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftoppm"]
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_image_unpadded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page-1.png"), b"png").unwrap();
        let found = find_page_image(dir.path(), 1).unwrap();
        assert_eq!(found.file_name().unwrap(), "page-1.png");
    }

    #[test]
    fn test_find_page_image_padded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page-007.png"), b"png").unwrap();
        let found = find_page_image(dir.path(), 7).unwrap();
        assert_eq!(found.file_name().unwrap(), "page-007.png");
    }

    #[test]
    fn test_find_page_image_missing() {
        let dir = TempDir::new().unwrap();
        assert!(find_page_image(dir.path(), 2).is_none());
    }

    #[test]
    fn test_check_tools_lists_pdftoppm() {
        let tools = check_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].0, "pdftoppm");
    }
}
