//! pagereview - side-by-side review pages for PDF transcription evaluation.
//!
//! Builds a static HTML page that lets a human reviewer compare a trusted
//! "gold" transcription against an "eval" transcription of the same PDF page.
//! For each entry the source PDF is fetched from object storage, the target
//! page is rendered to an embedded image, and the two texts are placed on
//! randomized sides so the reviewer cannot tell which is which.

pub mod cli;
pub mod models;
pub mod render;
pub mod report;
pub mod storage;

pub use models::{ComparisonEntry, RenderedEntry};
pub use render::{PdftoppmRenderer, RenderError, RenderPage};
pub use report::{ReportBuilder, ReportConfig, ReportEvent};
pub use storage::{ObjectStore, S3ObjectStore, S3Uri, StorageError};
