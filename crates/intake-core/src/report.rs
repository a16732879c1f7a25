//! The cumulative, client-side view of batch results.
//!
//! A full-batch submission replaces the report; a sub-batch (retry)
//! submission is merged into it by filename (replace-if-present,
//! append-if-new) so the presentation's "all results" view stays cumulative
//! across retries. Counters are always recomputed from the merged entries,
//! never incrementally drifted.

use serde::{Deserialize, Serialize};

use intake_parser::{BatchResult, FileResult, FileStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Accumulated server-side processing seconds across the original batch
    /// and every merged retry pass.
    pub total_processing_time: f64,
    pub results: Vec<FileResult>,
}

impl BatchReport {
    /// Build a fresh report from one full-batch response, discarding any
    /// previous result set.
    pub fn from_batch(batch: BatchResult) -> Self {
        let mut report = Self {
            total_files: 0,
            successful_files: 0,
            failed_files: 0,
            total_processing_time: batch.total_processing_time,
            results: batch.results,
        };
        report.recount();
        report
    }

    /// Merge a sub-batch response: replace entries whose filename is already
    /// present, append the rest, and accumulate processing time.
    pub fn merge(&mut self, batch: BatchResult) {
        for result in batch.results {
            match self
                .results
                .iter_mut()
                .find(|existing| existing.filename == result.filename)
            {
                Some(existing) => *existing = result,
                None => self.results.push(result),
            }
        }
        self.total_processing_time += batch.total_processing_time;
        self.recount();
    }

    fn recount(&mut self) {
        self.total_files = self.results.len();
        self.successful_files = self
            .results
            .iter()
            .filter(|r| r.status == FileStatus::Success)
            .count();
        self.failed_files = self.total_files - self.successful_files;
    }

    pub fn entry(&self, filename: &str) -> Option<&FileResult> {
        self.results.iter().find(|r| r.filename == filename)
    }

    pub fn failed_filenames(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.status == FileStatus::Failed)
            .map(|r| r.filename.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(filename: &str, status: FileStatus) -> FileResult {
        FileResult {
            filename: filename.to_string(),
            status,
            error: None,
            parsed_data: None,
            file_type: None,
            processing_time: None,
        }
    }

    fn batch(results: Vec<FileResult>, processing_time: f64) -> BatchResult {
        BatchResult {
            total_files: results.len(),
            successful_files: 0, // server counters are not trusted
            failed_files: 0,
            total_processing_time: processing_time,
            results,
        }
    }

    #[test]
    fn from_batch_recomputes_counters() {
        let report = BatchReport::from_batch(batch(
            vec![
                result("a.pdf", FileStatus::Success),
                result("b.docx", FileStatus::Failed),
            ],
            2.5,
        ));
        assert_eq!(report.total_files, 2);
        assert_eq!(report.successful_files, 1);
        assert_eq!(report.failed_files, 1);
        assert_eq!(report.total_processing_time, 2.5);
    }

    #[test]
    fn merge_replaces_existing_entry_by_filename() {
        let mut report = BatchReport::from_batch(batch(
            vec![
                result("a.pdf", FileStatus::Success),
                result("b.docx", FileStatus::Failed),
            ],
            2.0,
        ));

        report.merge(batch(vec![result("b.docx", FileStatus::Success)], 1.0));

        assert_eq!(report.total_files, 2);
        assert_eq!(report.successful_files, 2);
        assert_eq!(report.failed_files, 0);
        assert_eq!(report.total_processing_time, 3.0);
        assert!(report.entry("b.docx").unwrap().is_success());
    }

    #[test]
    fn merge_appends_unknown_filenames() {
        let mut report =
            BatchReport::from_batch(batch(vec![result("a.pdf", FileStatus::Success)], 1.0));
        report.merge(batch(vec![result("c.txt", FileStatus::Failed)], 0.5));

        assert_eq!(report.total_files, 2);
        assert_eq!(report.failed_filenames(), vec!["c.txt"]);
    }

    #[test]
    fn merge_preserves_original_ordering() {
        let mut report = BatchReport::from_batch(batch(
            vec![
                result("a.pdf", FileStatus::Failed),
                result("b.docx", FileStatus::Failed),
            ],
            0.0,
        ));
        report.merge(batch(vec![result("a.pdf", FileStatus::Success)], 0.0));

        let names: Vec<&str> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.docx"]);
    }

    #[test]
    fn counters_always_match_entries() {
        let mut report = BatchReport::from_batch(batch(
            vec![
                result("a.pdf", FileStatus::Failed),
                result("b.docx", FileStatus::Failed),
            ],
            0.0,
        ));
        report.merge(batch(
            vec![
                result("a.pdf", FileStatus::Success),
                result("b.docx", FileStatus::Failed),
            ],
            0.0,
        ));

        let success = report
            .results
            .iter()
            .filter(|r| r.status == FileStatus::Success)
            .count();
        assert_eq!(report.successful_files, success);
        assert_eq!(report.failed_files, report.total_files - success);
    }
}
