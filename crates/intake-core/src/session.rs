//! Batch submission orchestration.
//!
//! An [`ImportSession`] owns the upload queue, the failure recovery tracker
//! and the cumulative report, and drives submissions against an injected
//! [`ParseTransport`]. At most one submission is in flight at a time;
//! cancellation is cooperative and leaves queue and tracker untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use intake_parser::{ApiError, BatchResult, FileResult, FileStatus, ParserClient, UploadPart};

use crate::queue::{Admission, IncomingFile, QueueError, QueuedFile, UploadQueue};
use crate::recovery::{RecoveryTracker, Resolution};
use crate::report::BatchReport;
use crate::{CoreError, ProgressEvent};

/// Synthetic progress advances by this much per tick...
const PROGRESS_STEP: u8 = 7;
/// ...up to this ceiling; 100 is only reported once the response arrives.
const PROGRESS_CEILING: u8 = 90;

const DEFAULT_PROGRESS_TICK: Duration = Duration::from_millis(400);

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<BatchResult, ApiError>> + Send + 'a>>;

/// The seam between orchestration and the wire. Production code hands in a
/// [`ParserClient`]; tests hand in a scripted fake.
pub trait ParseTransport: Send + Sync {
    fn parse_batch(&self, files: Vec<UploadPart>) -> TransportFuture<'_>;
}

impl ParseTransport for ParserClient {
    fn parse_batch(&self, files: Vec<UploadPart>) -> TransportFuture<'_> {
        Box::pin(async move { ParserClient::parse_batch(self, &files).await })
    }
}

/// How a submission ended.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The server responded; results were partitioned and applied.
    Completed,
    /// Transport-level failure (network error, non-2xx). The whole batch is
    /// failed for bookkeeping and a synthesized all-failed report was
    /// applied so retry stays available. Never silent loss.
    TransportFailed { error: String },
    /// Cancelled mid-flight. No state was modified and no report produced.
    Cancelled,
}

/// Result of a subset resubmission.
#[derive(Debug, Clone)]
pub struct RetrySummary {
    /// Files actually resubmitted.
    pub submitted: usize,
    /// Requested filenames whose payload is no longer resident anywhere;
    /// the user must re-select these from disk.
    pub stale: Vec<String>,
    /// `None` when every requested payload was stale and nothing was sent.
    pub outcome: Option<SubmitOutcome>,
}

enum Run {
    Completed(BatchResult),
    Transport(ApiError),
    Cancelled,
}

pub struct ImportSession {
    queue: UploadQueue,
    recovery: Arc<RecoveryTracker>,
    report: Option<BatchReport>,
    in_flight: bool,
    progress_tick: Duration,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self::with_progress_tick(DEFAULT_PROGRESS_TICK)
    }

    pub fn with_progress_tick(progress_tick: Duration) -> Self {
        Self {
            queue: UploadQueue::new(),
            recovery: Arc::new(RecoveryTracker::new()),
            report: None,
            in_flight: false,
            progress_tick,
        }
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    pub fn recovery(&self) -> &RecoveryTracker {
        &self.recovery
    }

    /// Shared handle for presentation code running on another task.
    pub fn recovery_handle(&self) -> Arc<RecoveryTracker> {
        self.recovery.clone()
    }

    pub fn report(&self) -> Option<&BatchReport> {
        self.report.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight
    }

    pub fn add_files(
        &mut self,
        incoming: impl IntoIterator<Item = IncomingFile>,
    ) -> Result<Admission, QueueError> {
        self.queue.add(incoming)
    }

    pub fn remove_file(&mut self, index: usize) -> Option<QueuedFile> {
        self.queue.remove(index)
    }

    pub fn reduce_queue_to(&mut self, target: usize) {
        self.queue.reduce_to(target)
    }

    /// Submit the current queue as one batch.
    ///
    /// The queue is snapshotted at call time; later mutations do not affect
    /// the in-flight request. On completion, successes are evicted from the
    /// queue and failures recorded in the recovery tracker; the cumulative
    /// report is replaced. On transport failure an all-failed report is
    /// synthesized instead. Cancellation modifies nothing.
    pub async fn submit(
        &mut self,
        transport: &dyn ParseTransport,
        progress: impl Fn(ProgressEvent) + Send + Sync,
        cancel: CancellationToken,
    ) -> Result<SubmitOutcome, CoreError> {
        if self.in_flight {
            return Err(CoreError::Busy);
        }
        let snapshot = self.queue.snapshot();
        if snapshot.is_empty() {
            return Err(CoreError::EmptyBatch);
        }

        self.in_flight = true;
        let run = run_submission(transport, &snapshot, self.progress_tick, &progress, &cancel).await;
        self.in_flight = false;

        Ok(match run {
            Run::Cancelled => {
                log::info!("submission cancelled; queue and tracker unchanged");
                SubmitOutcome::Cancelled
            }
            Run::Completed(batch) => {
                self.apply(&snapshot, &batch, &progress);
                self.replace_report(BatchReport::from_batch(batch));
                SubmitOutcome::Completed
            }
            Run::Transport(err) => {
                log::warn!("batch submission failed at transport level: {err}");
                let synthesized = synthesize_failed(&snapshot, &err);
                self.apply(&snapshot, &synthesized, &progress);
                self.replace_report(BatchReport::from_batch(synthesized));
                SubmitOutcome::TransportFailed {
                    error: err.to_string(),
                }
            }
        })
    }

    /// Resubmit a subset of previously failed files by name.
    ///
    /// Payloads are resolved through the recovery tracker, falling back to
    /// the live queue. Filenames resident in neither are reported as stale
    /// and skipped. Results of the sub-batch are merged into the cumulative
    /// report by filename rather than replacing it.
    pub async fn resubmit(
        &mut self,
        filenames: &[String],
        transport: &dyn ParseTransport,
        progress: impl Fn(ProgressEvent) + Send + Sync,
        cancel: CancellationToken,
    ) -> Result<RetrySummary, CoreError> {
        if self.in_flight {
            return Err(CoreError::Busy);
        }

        let Resolution { mut resolved, missing } = self.recovery.resolve(filenames);
        let mut stale = Vec::new();
        for name in missing {
            match self.queue.lookup(&name) {
                Some(file) => resolved.push(file.clone()),
                None => stale.push(name),
            }
        }

        if resolved.is_empty() {
            return Ok(RetrySummary {
                submitted: 0,
                stale,
                outcome: None,
            });
        }

        progress(ProgressEvent::RetryPass {
            count: resolved.len(),
        });

        self.in_flight = true;
        let run = run_submission(transport, &resolved, self.progress_tick, &progress, &cancel).await;
        self.in_flight = false;

        let outcome = match run {
            Run::Cancelled => SubmitOutcome::Cancelled,
            Run::Completed(batch) => {
                self.apply(&resolved, &batch, &progress);
                self.merge_report(batch);
                SubmitOutcome::Completed
            }
            Run::Transport(err) => {
                log::warn!("retry submission failed at transport level: {err}");
                let synthesized = synthesize_failed(&resolved, &err);
                self.apply(&resolved, &synthesized, &progress);
                self.merge_report(synthesized);
                SubmitOutcome::TransportFailed {
                    error: err.to_string(),
                }
            }
        };

        Ok(RetrySummary {
            submitted: resolved.len(),
            stale,
            outcome: Some(outcome),
        })
    }

    /// Partition a response and apply the bookkeeping: evict successes from
    /// the queue (and tracker, for retries), record failures in the tracker
    /// with the payload from the submitted snapshot (falling back to the
    /// live queue).
    fn apply(
        &mut self,
        snapshot: &[QueuedFile],
        batch: &BatchResult,
        progress: &(impl Fn(ProgressEvent) + Send + Sync),
    ) {
        let total = batch.results.len();
        for (index, result) in batch.results.iter().enumerate() {
            match result.status {
                FileStatus::Success => {
                    self.queue.evict(&result.filename);
                    self.recovery.discard(&result.filename);
                }
                FileStatus::Failed => {
                    let payload = snapshot
                        .iter()
                        .find(|f| f.name == result.filename)
                        .or_else(|| self.queue.lookup(&result.filename));
                    match payload {
                        Some(file) => {
                            self.recovery.record(&result.filename, file.payload.clone(), file.mime)
                        }
                        None => log::warn!(
                            "no resident payload for failed file {}; retry unavailable",
                            result.filename
                        ),
                    }
                }
            }
            progress(ProgressEvent::FileOutcome {
                index,
                total,
                result: result.clone(),
            });
        }
    }

    /// Install the report of a full-batch submission. It supersedes the
    /// previous one, so tracker entries for filenames that no longer appear
    /// as failed are dropped.
    fn replace_report(&mut self, report: BatchReport) {
        self.recovery.retain_named(&report.failed_filenames());
        self.report = Some(report);
    }

    fn merge_report(&mut self, batch: BatchResult) {
        match &mut self.report {
            Some(report) => report.merge(batch),
            None => self.report = Some(BatchReport::from_batch(batch)),
        }
    }
}

/// Drive one request with synthetic progress ticks, racing cancellation.
async fn run_submission(
    transport: &dyn ParseTransport,
    snapshot: &[QueuedFile],
    tick: Duration,
    progress: &(impl Fn(ProgressEvent) + Send + Sync),
    cancel: &CancellationToken,
) -> Run {
    progress(ProgressEvent::SubmissionStarted {
        file_count: snapshot.len(),
    });

    let parts: Vec<UploadPart> = snapshot.iter().map(QueuedFile::to_part).collect();
    // TransportFuture is already boxed and pinned; poll it by &mut.
    let mut request = transport.parse_batch(parts);

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut percent: u8 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Run::Cancelled,
            result = &mut request => {
                return match result {
                    Ok(batch) => {
                        progress(ProgressEvent::UploadProgress { percent: 100 });
                        Run::Completed(batch)
                    }
                    Err(err) => Run::Transport(err),
                };
            }
            _ = ticker.tick() => {
                if percent < PROGRESS_CEILING {
                    percent = (percent + PROGRESS_STEP).min(PROGRESS_CEILING);
                    progress(ProgressEvent::UploadProgress { percent });
                }
            }
        }
    }
}

/// Best-effort report for a transport-level failure: every submitted file
/// marked failed with the transport error, so the presentation can still
/// offer retry.
fn synthesize_failed(snapshot: &[QueuedFile], error: &ApiError) -> BatchResult {
    let results: Vec<FileResult> = snapshot
        .iter()
        .map(|file| FileResult {
            filename: file.name.clone(),
            status: FileStatus::Failed,
            error: Some(error.to_string()),
            parsed_data: None,
            file_type: None,
            processing_time: None,
        })
        .collect();
    BatchResult {
        total_files: results.len(),
        successful_files: 0,
        failed_files: results.len(),
        total_processing_time: 0.0,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use bytes::Bytes;

    fn incoming(name: &str) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            payload: Bytes::from_static(b"stub bytes"),
            declared_mime: None,
        }
    }

    fn wire_result(filename: &str, status: FileStatus, error: Option<&str>) -> FileResult {
        FileResult {
            filename: filename.to_string(),
            status,
            error: error.map(str::to_string),
            parsed_data: None,
            file_type: None,
            processing_time: Some(0.5),
        }
    }

    fn wire_batch(results: Vec<FileResult>) -> BatchResult {
        let successful = results.iter().filter(|r| r.is_success()).count();
        BatchResult {
            total_files: results.len(),
            successful_files: successful,
            failed_files: results.len() - successful,
            total_processing_time: 1.0,
            results,
        }
    }

    /// Transport that pops scripted responses in order.
    struct FakeTransport {
        responses: Mutex<VecDeque<Result<BatchResult, ApiError>>>,
    }

    impl FakeTransport {
        fn scripted(responses: Vec<Result<BatchResult, ApiError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl ParseTransport for FakeTransport {
        fn parse_batch(&self, _files: Vec<UploadPart>) -> TransportFuture<'_> {
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted transport call");
            Box::pin(async move { response })
        }
    }

    /// Transport whose request never completes.
    struct PendingTransport;

    impl ParseTransport for PendingTransport {
        fn parse_batch(&self, _files: Vec<UploadPart>) -> TransportFuture<'_> {
            Box::pin(std::future::pending())
        }
    }

    /// Transport whose response only arrives after a delay (paused-clock
    /// tests auto-advance through it).
    struct DelayedTransport {
        delay: Duration,
        batch: BatchResult,
    }

    impl ParseTransport for DelayedTransport {
        fn parse_batch(&self, _files: Vec<UploadPart>) -> TransportFuture<'_> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok(self.batch.clone())
            })
        }
    }

    fn collect() -> (
        Arc<Mutex<Vec<ProgressEvent>>>,
        impl Fn(ProgressEvent) + Send + Sync,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |event| sink.lock().unwrap().push(event))
    }

    #[tokio::test]
    async fn partition_evicts_successes_and_tracks_failures() {
        let mut session = ImportSession::new();
        session
            .add_files(vec![incoming("a.pdf"), incoming("b.docx"), incoming("c.txt")])
            .unwrap();

        let transport = FakeTransport::scripted(vec![Ok(wire_batch(vec![
            wire_result("a.pdf", FileStatus::Success, None),
            wire_result("b.docx", FileStatus::Failed, Some("unreadable")),
            wire_result("c.txt", FileStatus::Success, None),
        ]))]);

        let (_events, progress) = collect();
        let outcome = session
            .submit(&transport, progress, CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Completed));
        // Queue shrinks by exactly the number of successes.
        assert_eq!(session.queue().len(), 1);
        assert!(session.queue().lookup("b.docx").is_some());
        // Tracker gains exactly the failed filenames.
        assert_eq!(session.recovery().tracked_names(), vec!["b.docx"]);
        let report = session.report().unwrap();
        assert_eq!(report.successful_files, 2);
        assert_eq!(report.failed_files, 1);
        assert!(!session.is_processing());
    }

    #[tokio::test]
    async fn transport_failure_synthesizes_all_failed_report() {
        let mut session = ImportSession::new();
        session
            .add_files(vec![incoming("a.pdf"), incoming("b.docx")])
            .unwrap();

        let transport = FakeTransport::scripted(vec![Err(ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        })]);

        let (_events, progress) = collect();
        let outcome = session
            .submit(&transport, progress, CancellationToken::new())
            .await
            .unwrap();

        match outcome {
            SubmitOutcome::TransportFailed { error } => assert!(error.contains("502")),
            other => panic!("expected TransportFailed, got {other:?}"),
        }
        // No evictions, but every file is retryable.
        assert_eq!(session.queue().len(), 2);
        assert_eq!(session.recovery().len(), 2);
        let report = session.report().unwrap();
        assert_eq!(report.failed_files, 2);
        assert!(report.results[0].error.as_deref().unwrap().contains("bad gateway"));
    }

    #[tokio::test]
    async fn cancellation_leaves_state_untouched() {
        let mut session = ImportSession::new();
        session
            .add_files(vec![incoming("a.pdf"), incoming("b.docx")])
            .unwrap();

        let transport = PendingTransport;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (_events, progress) = collect();
        let outcome = session.submit(&transport, progress, cancel).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Cancelled));
        assert_eq!(session.queue().len(), 2);
        assert!(session.recovery().is_empty());
        assert!(session.report().is_none());
    }

    #[tokio::test]
    async fn empty_queue_is_rejected() {
        let mut session = ImportSession::new();
        let transport = FakeTransport::scripted(vec![]);
        let (_events, progress) = collect();
        let err = session
            .submit(&transport, progress, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyBatch));
    }

    #[tokio::test]
    async fn retry_success_clears_tracker_and_merges_report() {
        let mut session = ImportSession::new();
        session
            .add_files(vec![incoming("a.pdf"), incoming("b.docx")])
            .unwrap();

        let transport = FakeTransport::scripted(vec![
            Ok(wire_batch(vec![
                wire_result("a.pdf", FileStatus::Success, None),
                wire_result("b.docx", FileStatus::Failed, Some("timeout")),
            ])),
            Ok(wire_batch(vec![wire_result(
                "b.docx",
                FileStatus::Success,
                None,
            )])),
        ]);

        let (_events, progress) = collect();
        session
            .submit(&transport, &progress, CancellationToken::new())
            .await
            .unwrap();

        let summary = session
            .resubmit(
                &["b.docx".to_string()],
                &transport,
                &progress,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(summary.submitted, 1);
        assert!(summary.stale.is_empty());
        assert!(matches!(summary.outcome, Some(SubmitOutcome::Completed)));

        // Retried file left both tracker and live queue.
        assert!(session.recovery().is_empty());
        assert!(session.queue().is_empty());
        // Cumulative result flipped to success, counters follow.
        let report = session.report().unwrap();
        assert_eq!(report.total_files, 2);
        assert_eq!(report.successful_files, 2);
        assert!(report.entry("b.docx").unwrap().is_success());
    }

    #[tokio::test]
    async fn new_full_batch_supersedes_report_and_prunes_tracker() {
        let mut session = ImportSession::new();
        session.add_files(vec![incoming("a.pdf")]).unwrap();

        let transport = FakeTransport::scripted(vec![
            Ok(wire_batch(vec![wire_result(
                "a.pdf",
                FileStatus::Failed,
                Some("parse error"),
            )])),
            Ok(wire_batch(vec![wire_result("b.docx", FileStatus::Success, None)])),
        ]);

        let (_events, progress) = collect();
        session
            .submit(&transport, &progress, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(session.recovery().tracked_names(), vec!["a.pdf"]);

        // The user drops a.pdf instead of retrying it and submits a fresh
        // batch. The new report replaces the old one, so a.pdf must no
        // longer be tracked as retryable.
        session.remove_file(0);
        session.add_files(vec![incoming("b.docx")]).unwrap();
        session
            .submit(&transport, &progress, CancellationToken::new())
            .await
            .unwrap();

        assert!(session.recovery().is_empty());
        let report = session.report().unwrap();
        assert_eq!(report.total_files, 1);
        assert!(report.entry("a.pdf").is_none());
        assert!(report.entry("b.docx").unwrap().is_success());
    }

    #[tokio::test]
    async fn resubmit_with_no_resident_payload_reports_stale() {
        let mut session = ImportSession::new();
        let transport = FakeTransport::scripted(vec![]);
        let (_events, progress) = collect();

        let summary = session
            .resubmit(
                &["ghost.pdf".to_string()],
                &transport,
                progress,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(summary.submitted, 0);
        assert_eq!(summary.stale, vec!["ghost.pdf"]);
        assert!(summary.outcome.is_none());
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        // upload a.pdf, b.docx, c.exe -> c.exe rejected at admission
        let mut session = ImportSession::new();
        let admission = session
            .add_files(vec![incoming("a.pdf"), incoming("b.docx"), incoming("c.exe")])
            .unwrap();
        assert_eq!(admission.admitted, vec!["a.pdf", "b.docx"]);
        assert_eq!(admission.rejected[0].name, "c.exe");
        assert_eq!(session.queue().len(), 2);

        let transport = FakeTransport::scripted(vec![
            Ok(wire_batch(vec![
                wire_result("a.pdf", FileStatus::Success, None),
                wire_result("b.docx", FileStatus::Failed, Some("parse error")),
            ])),
            Ok(wire_batch(vec![wire_result(
                "b.docx",
                FileStatus::Success,
                None,
            )])),
        ]);

        let (_events, progress) = collect();

        // First submission: a.pdf evicted, b.docx tracked for retry.
        session
            .submit(&transport, &progress, CancellationToken::new())
            .await
            .unwrap();
        assert!(session.queue().lookup("a.pdf").is_none());
        assert_eq!(session.recovery().tracked_names(), vec!["b.docx"]);

        // Re-upload b.docx: tracker drains, both files end up successful.
        session
            .resubmit(
                &["b.docx".to_string()],
                &transport,
                &progress,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(session.recovery().is_empty());
        let report = session.report().unwrap();
        assert_eq!(report.total_files, 2);
        assert_eq!(report.successful_files, 2);
        assert_eq!(report.failed_files, 0);
        assert!(report.entry("a.pdf").unwrap().is_success());
        assert!(report.entry("b.docx").unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn synthetic_progress_stays_below_hundred_until_response() {
        let mut session = ImportSession::new();
        session.add_files(vec![incoming("a.pdf")]).unwrap();

        let transport = DelayedTransport {
            delay: Duration::from_secs(30),
            batch: wire_batch(vec![wire_result("a.pdf", FileStatus::Success, None)]),
        };

        let (events, progress) = collect();
        session
            .submit(&transport, progress, CancellationToken::new())
            .await
            .unwrap();

        let events = events.lock().unwrap();
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::UploadProgress { percent } => Some(*percent),
                _ => None,
            })
            .collect();

        // Monotonic, capped before the response, 100 exactly once at the end.
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        let (last, before) = percents.split_last().unwrap();
        assert_eq!(*last, 100);
        assert!(!before.is_empty());
        assert!(before.iter().all(|p| *p <= PROGRESS_CEILING));
        assert!(matches!(
            events.first(),
            Some(ProgressEvent::SubmissionStarted { file_count: 1 })
        ));
    }

    #[tokio::test]
    async fn retry_pass_event_precedes_sub_batch() {
        let mut session = ImportSession::new();
        session.add_files(vec![incoming("b.docx")]).unwrap();

        let transport = FakeTransport::scripted(vec![
            Ok(wire_batch(vec![wire_result(
                "b.docx",
                FileStatus::Failed,
                Some("parse error"),
            )])),
            Ok(wire_batch(vec![wire_result(
                "b.docx",
                FileStatus::Success,
                None,
            )])),
        ]);

        let (events, progress) = collect();
        session
            .submit(&transport, &progress, CancellationToken::new())
            .await
            .unwrap();
        session
            .resubmit(
                &["b.docx".to_string()],
                &transport,
                &progress,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::RetryPass { count: 1 })));
    }
}
