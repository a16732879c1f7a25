use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use intake_core::{BatchReport, PersistedResume, ProgressEvent, SubmitOutcome};

/// Commands flowing from the TUI to the backend task that owns the session.
#[derive(Debug)]
pub enum BackendCommand {
    AddFiles {
        paths: Vec<PathBuf>,
    },
    RemoveFile {
        index: usize,
    },
    Submit {
        cancel: CancellationToken,
    },
    Retry {
        filenames: Vec<String>,
        cancel: CancellationToken,
    },
    LoadRecords,
    DeleteRecord {
        id: i64,
    },
    ExportReport {
        path: PathBuf,
    },
}

/// Severity of a transient status-line notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// One file of the live queue, as shown on the queue screen.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub name: String,
    pub size: usize,
    pub mime: &'static str,
}

/// Events flowing from the backend task to the TUI.
#[derive(Debug)]
pub enum BackendEvent {
    /// The live queue changed (admission, removal, eviction).
    QueueChanged { files: Vec<QueueEntry> },
    /// Progress of an in-flight submission.
    Progress(ProgressEvent),
    /// A submission or retry pass ended.
    SubmissionFinished {
        outcome: SubmitOutcome,
        stale: Vec<String>,
    },
    /// The cumulative report changed.
    ReportChanged { report: BatchReport },
    /// The set of retryable filenames changed.
    TrackerChanged { tracked: Vec<String> },
    /// Result of a persisted-records fetch.
    RecordsLoaded {
        result: Result<Vec<PersistedResume>, String>,
    },
    /// A persisted record was deleted (or the attempt failed).
    RecordDeleted { id: i64, error: Option<String> },
    /// A report export finished.
    ReportExported {
        path: PathBuf,
        error: Option<String>,
    },
    /// Free-form status message for the notice line.
    Notice {
        level: NoticeLevel,
        message: String,
    },
}
