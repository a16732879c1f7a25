use thiserror::Error;

pub mod config;
pub mod filetype;
pub mod queue;
pub mod recovery;
pub mod report;
pub mod session;

pub use config::Config;
pub use queue::{Admission, IncomingFile, QueueError, QueuedFile, RejectedFile, UploadQueue};
pub use recovery::{RecoveryTracker, Resolution};
pub use report::BatchReport;
pub use session::{ImportSession, ParseTransport, RetrySummary, SubmitOutcome, TransportFuture};

// Re-export the wire types for convenience
pub use intake_parser::{ApiError, BatchResult, FileResult, FileStatus, PersistedResume, UploadPart};

/// Hard client-side ceiling on files per submission.
pub const MAX_BATCH_FILES: usize = 10;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("nothing to submit")]
    EmptyBatch,
    #[error("config file error: {0}")]
    Config(String),
}

/// Progress events emitted during a submission.
///
/// Upload progress is synthetic: it advances in fixed increments on a fixed
/// interval up to a ceiling below 100, and 100 is only reported once the
/// server response has arrived. It approximates liveness, not bytes sent.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    SubmissionStarted {
        file_count: usize,
    },
    UploadProgress {
        percent: u8,
    },
    /// Emitted once per file while the response is partitioned.
    FileOutcome {
        index: usize,
        total: usize,
        result: FileResult,
    },
    /// A user-initiated resubmission of previously failed files is starting.
    RetryPass {
        count: usize,
    },
}
