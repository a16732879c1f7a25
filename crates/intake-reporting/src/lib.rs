pub mod export;
pub mod types;

pub use export::{export_json, export_results, render_text};
pub use types::{ExportFormat, ReportError};
