use intake_core::{BatchReport, FileResult, FileStatus};

/// Display phase of one file on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Success,
    Failed,
    Retrying,
}

impl RowPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "Parsed",
            Self::Failed => "Failed",
            Self::Retrying => "Retrying...",
        }
    }
}

/// One row of the results table, derived from the cumulative report.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub filename: String,
    pub phase: RowPhase,
    pub error: Option<String>,
    pub file_type: Option<String>,
    pub processing_time: Option<f64>,
    /// Whether the original payload is still resident for retry.
    pub retryable: bool,
}

impl ResultRow {
    pub fn from_result(result: &FileResult, retrying: bool, retryable: bool) -> Self {
        let phase = match result.status {
            FileStatus::Success => RowPhase::Success,
            FileStatus::Failed if retrying => RowPhase::Retrying,
            FileStatus::Failed => RowPhase::Failed,
        };
        Self {
            filename: result.filename.clone(),
            phase,
            error: result.error.clone(),
            file_type: result.file_type.clone(),
            processing_time: result.processing_time,
            retryable,
        }
    }

    pub fn detail_label(&self) -> String {
        match self.phase {
            RowPhase::Success => self
                .processing_time
                .map(|t| format!("{t:.2}s"))
                .unwrap_or_default(),
            RowPhase::Retrying => String::new(),
            RowPhase::Failed => {
                let mut label = self.error.clone().unwrap_or_else(|| "unknown error".into());
                if !self.retryable {
                    label.push_str(" (re-upload manually)");
                }
                label
            }
        }
    }
}

/// Aggregate counters shown above the results table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub processing_time: f64,
}

impl Counters {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            total: report.total_files,
            success: report.successful_files,
            failed: report.failed_files,
            processing_time: report.total_processing_time,
        }
    }
}

/// Sort order for the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Original,
    FailedFirst,
    Name,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            Self::Original => Self::FailedFirst,
            Self::FailedFirst => Self::Name,
            Self::Name => Self::Original,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "order",
            Self::FailedFirst => "failed",
            Self::Name => "name",
        }
    }
}

/// Compute the visual row order for the current sort.
pub fn sorted_indices(rows: &[ResultRow], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    match order {
        SortOrder::Original => {}
        SortOrder::FailedFirst => {
            indices.sort_by_key(|&i| match rows[i].phase {
                RowPhase::Failed | RowPhase::Retrying => 0,
                RowPhase::Success => 1,
            });
        }
        SortOrder::Name => {
            indices.sort_by(|&a, &b| rows[a].filename.cmp(&rows[b].filename));
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(filename: &str, phase: RowPhase) -> ResultRow {
        ResultRow {
            filename: filename.to_string(),
            phase,
            error: None,
            file_type: None,
            processing_time: None,
            retryable: phase == RowPhase::Failed,
        }
    }

    #[test]
    fn failed_first_is_stable_within_groups() {
        let rows = vec![
            row("a.pdf", RowPhase::Success),
            row("b.docx", RowPhase::Failed),
            row("c.txt", RowPhase::Success),
            row("d.rtf", RowPhase::Failed),
        ];
        assert_eq!(sorted_indices(&rows, SortOrder::FailedFirst), vec![1, 3, 0, 2]);
    }

    #[test]
    fn name_sort_is_alphabetical() {
        let rows = vec![
            row("z.pdf", RowPhase::Success),
            row("a.pdf", RowPhase::Failed),
        ];
        assert_eq!(sorted_indices(&rows, SortOrder::Name), vec![1, 0]);
    }

    #[test]
    fn sort_order_cycles() {
        assert_eq!(SortOrder::Original.next(), SortOrder::FailedFirst);
        assert_eq!(SortOrder::Name.next(), SortOrder::Original);
    }
}
