//! Render and export a finished batch report.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use intake_core::{BatchReport, FileStatus};

use crate::types::{ExportFormat, ReportError};

/// Write the report as pretty-printed JSON.
pub fn export_json(report: &BatchReport, writer: &mut impl Write) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Render the report as a plain-text summary with one line per file.
pub fn render_text(report: &BatchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Batch import report");
    let _ = writeln!(out, "===================");
    let _ = writeln!(out, "Total files:     {}", report.total_files);
    let _ = writeln!(out, "Successful:      {}", report.successful_files);
    let _ = writeln!(out, "Failed:          {}", report.failed_files);
    let _ = writeln!(
        out,
        "Processing time: {:.2}s",
        report.total_processing_time
    );
    let _ = writeln!(out);

    let name_width = report
        .results
        .iter()
        .map(|r| r.filename.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let _ = writeln!(out, "{:<name_width$}  {:<8}  DETAIL", "FILE", "STATUS");
    for result in &report.results {
        let status = match result.status {
            FileStatus::Success => "ok",
            FileStatus::Failed => "FAILED",
        };
        let detail = match result.status {
            FileStatus::Success => result
                .processing_time
                .map(|t| format!("{t:.2}s"))
                .unwrap_or_default(),
            FileStatus::Failed => result.error.clone().unwrap_or_else(|| "unknown error".into()),
        };
        let _ = writeln!(out, "{:<name_width$}  {status:<8}  {detail}", result.filename);
    }

    out
}

/// Export the report to `path` in the given format.
pub fn export_results(
    report: &BatchReport,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ReportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Json => export_json(report, &mut writer)?,
        ExportFormat::Text => writer.write_all(render_text(report).as_bytes())?,
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use intake_core::{BatchResult, FileResult};

    fn sample_report() -> BatchReport {
        BatchReport::from_batch(BatchResult {
            total_files: 2,
            successful_files: 1,
            failed_files: 1,
            total_processing_time: 3.5,
            results: vec![
                FileResult {
                    filename: "a.pdf".to_string(),
                    status: FileStatus::Success,
                    error: None,
                    parsed_data: Some(serde_json::json!({"name": "Ada"})),
                    file_type: Some("pdf".to_string()),
                    processing_time: Some(2.25),
                },
                FileResult {
                    filename: "b.docx".to_string(),
                    status: FileStatus::Failed,
                    error: Some("corrupt header".to_string()),
                    parsed_data: None,
                    file_type: None,
                    processing_time: None,
                },
            ],
        })
    }

    #[test]
    fn text_rendering_includes_counters_and_rows() {
        let text = render_text(&sample_report());
        assert!(text.contains("Total files:     2"));
        assert!(text.contains("Successful:      1"));
        assert!(text.contains("a.pdf"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("corrupt header"));
    }

    #[test]
    fn json_export_round_trips() {
        let report = sample_report();
        let mut buffer = Vec::new();
        export_json(&report, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["total_files"], 2);
        assert_eq!(value["results"][1]["status"], "failed");
        assert_eq!(value["results"][0]["parsed_data"]["name"], "Ada");
    }

    #[test]
    fn export_results_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let json_path = dir.path().join("report.json");
        export_results(&report, &json_path, ExportFormat::Json).unwrap();
        let raw = std::fs::read_to_string(&json_path).unwrap();
        assert!(raw.trim_start().starts_with('{'));

        let text_path = dir.path().join("report.txt");
        export_results(&report, &text_path, ExportFormat::Text).unwrap();
        let raw = std::fs::read_to_string(&text_path).unwrap();
        assert!(raw.starts_with("Batch import report"));
    }
}
