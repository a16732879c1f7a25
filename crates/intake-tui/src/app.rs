use std::collections::HashSet;

use intake_core::{BatchReport, PersistedResume, ProgressEvent, SubmitOutcome};

use crate::action::Action;
use crate::model::file::{sorted_indices, Counters, ResultRow, SortOrder};
use crate::theme::Theme;
use crate::tui_event::{BackendEvent, NoticeLevel, QueueEntry};

/// Which screen is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Queue,
    Results,
    ResultDetail(usize),  // index into results vec
    Records,
    RecordDetail(usize),  // index into records vec
}

/// Loading state of the persisted-records screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordsState {
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// A side effect the main loop must perform for the TUI: send a command to
/// the backend task or cancel the in-flight submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Submit,
    Retry(Vec<String>),
    RemoveFile(usize),
    LoadRecords,
    DeleteRecord(i64),
    ExportReport,
    CancelSubmission,
}

/// Main application state.
pub struct App {
    pub screen: Screen,
    pub queue: Vec<QueueEntry>,
    pub report: Option<BatchReport>,
    pub results: Vec<ResultRow>,
    /// Maps visual row index → results index (recomputed on sort/change).
    pub results_sorted: Vec<usize>,
    pub counters: Counters,
    pub tracked: Vec<String>,
    retrying: HashSet<String>,
    pub records: Vec<PersistedResume>,
    pub records_state: RecordsState,
    pub is_processing: bool,
    pub progress_percent: u8,
    pub notice: Option<(NoticeLevel, String)>,
    pub queue_cursor: usize,
    pub results_cursor: usize,
    pub records_cursor: usize,
    pub sort_order: SortOrder,
    pub tick: usize,
    pub theme: Theme,
    pub should_quit: bool,
    pub show_help: bool,
    pub detail_scroll: u16,
    /// Height of the visible table area (set on resize, used for page up/down).
    pub visible_rows: usize,
}

impl App {
    pub fn new() -> Self {
        Self {
            screen: Screen::Queue,
            queue: Vec::new(),
            report: None,
            results: Vec::new(),
            results_sorted: Vec::new(),
            counters: Counters::default(),
            tracked: Vec::new(),
            retrying: HashSet::new(),
            records: Vec::new(),
            records_state: RecordsState::Idle,
            is_processing: false,
            progress_percent: 0,
            notice: None,
            queue_cursor: 0,
            results_cursor: 0,
            records_cursor: 0,
            sort_order: SortOrder::Original,
            tick: 0,
            theme: Theme::dark(),
            should_quit: false,
            show_help: false,
            detail_scroll: 0,
            visible_rows: 20,
        }
    }

    fn recompute_sorted_indices(&mut self) {
        self.results_sorted = sorted_indices(&self.results, self.sort_order);
        if self.results_cursor >= self.results_sorted.len() {
            self.results_cursor = self.results_sorted.len().saturating_sub(1);
        }
    }

    fn set_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some((level, message.into()));
    }

    /// Process a user action. Returns a side effect for the main loop when
    /// the action requires the backend.
    pub fn update(&mut self, action: Action) -> Option<Outbound> {
        // When help overlay is shown, only allow a few actions through
        if self.show_help {
            match action {
                Action::Quit => self.should_quit = true,
                Action::ToggleHelp | Action::NavigateBack => self.show_help = false,
                Action::Tick => self.tick = self.tick.wrapping_add(1),
                Action::Resize(_w, h) => self.visible_rows = (h as usize).saturating_sub(6),
                _ => {} // swallow everything else
            }
            return None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ToggleHelp => {
                self.show_help = true;
            }
            Action::NavigateBack => match &self.screen {
                Screen::ResultDetail(_) => self.screen = Screen::Results,
                Screen::RecordDetail(_) => self.screen = Screen::Records,
                Screen::Results | Screen::Records => self.screen = Screen::Queue,
                Screen::Queue => {}
            },
            Action::NextScreen => {
                self.screen = match &self.screen {
                    Screen::Queue => Screen::Results,
                    Screen::Results | Screen::ResultDetail(_) => Screen::Records,
                    Screen::Records | Screen::RecordDetail(_) => Screen::Queue,
                };
                if self.screen == Screen::Records && self.records_state == RecordsState::Idle {
                    self.records_state = RecordsState::Loading;
                    return Some(Outbound::LoadRecords);
                }
            }
            Action::DrillIn => match &self.screen {
                Screen::Results => {
                    if self.results_cursor < self.results_sorted.len() {
                        self.detail_scroll = 0;
                        self.screen =
                            Screen::ResultDetail(self.results_sorted[self.results_cursor]);
                    }
                }
                Screen::Records => {
                    if self.records_cursor < self.records.len() {
                        self.detail_scroll = 0;
                        self.screen = Screen::RecordDetail(self.records_cursor);
                    }
                }
                _ => {}
            },
            Action::MoveDown => self.move_cursor(1),
            Action::MoveUp => self.move_cursor(-1),
            Action::PageDown => self.move_cursor(self.visible_rows.max(1) as isize),
            Action::PageUp => self.move_cursor(-(self.visible_rows.max(1) as isize)),
            Action::GoTop => match &self.screen {
                Screen::Queue => self.queue_cursor = 0,
                Screen::Results => self.results_cursor = 0,
                Screen::Records => self.records_cursor = 0,
                Screen::ResultDetail(_) | Screen::RecordDetail(_) => self.detail_scroll = 0,
            },
            Action::GoBottom => match &self.screen {
                Screen::Queue => self.queue_cursor = self.queue.len().saturating_sub(1),
                Screen::Results => {
                    self.results_cursor = self.results_sorted.len().saturating_sub(1)
                }
                Screen::Records => self.records_cursor = self.records.len().saturating_sub(1),
                Screen::ResultDetail(_) | Screen::RecordDetail(_) => {
                    self.detail_scroll = u16::MAX; // clamped by Paragraph rendering
                }
            },
            Action::CycleSort => {
                if self.screen == Screen::Results {
                    self.sort_order = self.sort_order.next();
                    self.recompute_sorted_indices();
                }
            }
            Action::Submit => {
                if self.screen != Screen::Queue {
                    return None;
                }
                if self.is_processing {
                    self.set_notice(NoticeLevel::Warn, "a submission is already in flight");
                } else if self.queue.is_empty() {
                    self.set_notice(NoticeLevel::Warn, "queue is empty");
                } else {
                    return Some(Outbound::Submit);
                }
            }
            Action::RetryFailed => {
                if self.screen != Screen::Results {
                    return None;
                }
                if self.is_processing {
                    self.set_notice(NoticeLevel::Warn, "a submission is already in flight");
                } else if self.tracked.is_empty() {
                    self.set_notice(NoticeLevel::Info, "nothing to retry");
                } else {
                    self.retrying = self.tracked.iter().cloned().collect();
                    return Some(Outbound::Retry(self.tracked.clone()));
                }
            }
            Action::RemoveSelected => {
                if self.screen == Screen::Queue && !self.is_processing {
                    if self.queue_cursor < self.queue.len() {
                        return Some(Outbound::RemoveFile(self.queue_cursor));
                    }
                }
            }
            Action::CancelSubmission => {
                if self.is_processing {
                    return Some(Outbound::CancelSubmission);
                }
            }
            Action::RefreshRecords => {
                if matches!(self.screen, Screen::Records | Screen::RecordDetail(_)) {
                    self.records_state = RecordsState::Loading;
                    return Some(Outbound::LoadRecords);
                }
            }
            Action::DeleteRecord => {
                if let Screen::Records = self.screen {
                    if let Some(record) = self.records.get(self.records_cursor) {
                        return Some(Outbound::DeleteRecord(record.id));
                    }
                }
            }
            Action::SaveReport => {
                if self.report.is_some() {
                    return Some(Outbound::ExportReport);
                }
                self.set_notice(NoticeLevel::Warn, "no report to save yet");
            }
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            Action::Resize(_w, h) => {
                // Rough estimate: total height minus header/footer/borders
                self.visible_rows = (h as usize).saturating_sub(6);
            }
            Action::None => {}
        }
        None
    }

    fn move_cursor(&mut self, delta: isize) {
        let step = |cursor: usize, len: usize| -> usize {
            if len == 0 {
                return 0;
            }
            let moved = cursor as isize + delta;
            moved.clamp(0, len as isize - 1) as usize
        };
        match &self.screen {
            Screen::Queue => self.queue_cursor = step(self.queue_cursor, self.queue.len()),
            Screen::Results => {
                self.results_cursor = step(self.results_cursor, self.results_sorted.len())
            }
            Screen::Records => self.records_cursor = step(self.records_cursor, self.records.len()),
            Screen::ResultDetail(_) | Screen::RecordDetail(_) => {
                self.detail_scroll = if delta < 0 {
                    self.detail_scroll.saturating_sub(delta.unsigned_abs() as u16)
                } else {
                    self.detail_scroll.saturating_add(delta as u16)
                };
            }
        }
    }

    /// Process a backend event and update model state.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::QueueChanged { files } => {
                self.queue = files;
                if self.queue_cursor >= self.queue.len() {
                    self.queue_cursor = self.queue.len().saturating_sub(1);
                }
            }
            BackendEvent::Progress(progress) => self.handle_progress(progress),
            BackendEvent::SubmissionFinished { outcome, stale } => {
                self.is_processing = false;
                self.retrying.clear();
                match outcome {
                    SubmitOutcome::Completed => {
                        self.progress_percent = 100;
                        self.set_notice(NoticeLevel::Info, "batch complete");
                        if self.screen == Screen::Queue {
                            self.screen = Screen::Results;
                        }
                    }
                    SubmitOutcome::TransportFailed { error } => {
                        self.set_notice(NoticeLevel::Error, format!("transport failure: {error}"));
                        if self.screen == Screen::Queue {
                            self.screen = Screen::Results;
                        }
                    }
                    SubmitOutcome::Cancelled => {
                        self.progress_percent = 0;
                        self.set_notice(NoticeLevel::Warn, "submission cancelled");
                    }
                }
                if !stale.is_empty() {
                    self.set_notice(
                        NoticeLevel::Warn,
                        format!(
                            "{} no longer available, re-upload manually",
                            stale.join(", ")
                        ),
                    );
                }
            }
            BackendEvent::ReportChanged { report } => {
                self.counters = Counters::from_report(&report);
                self.report = Some(report);
                self.rebuild_rows();
            }
            BackendEvent::TrackerChanged { tracked } => {
                self.tracked = tracked;
                self.rebuild_rows();
            }
            BackendEvent::RecordsLoaded { result } => match result {
                Ok(records) => {
                    self.records = records;
                    self.records_state = RecordsState::Loaded;
                    if self.records_cursor >= self.records.len() {
                        self.records_cursor = self.records.len().saturating_sub(1);
                    }
                }
                Err(message) => {
                    self.records_state = RecordsState::Error(message.clone());
                    self.set_notice(NoticeLevel::Error, message);
                }
            },
            BackendEvent::RecordDeleted { id, error } => match error {
                Some(message) => self.set_notice(NoticeLevel::Error, message),
                None => {
                    self.records.retain(|r| r.id != id);
                    if self.records_cursor >= self.records.len() {
                        self.records_cursor = self.records.len().saturating_sub(1);
                    }
                    if matches!(self.screen, Screen::RecordDetail(_)) {
                        self.screen = Screen::Records;
                    }
                    self.set_notice(NoticeLevel::Info, format!("record {id} deleted"));
                }
            },
            BackendEvent::ReportExported { path, error } => match error {
                Some(message) => self.set_notice(NoticeLevel::Error, message),
                None => self.set_notice(
                    NoticeLevel::Info,
                    format!("report written to {}", path.display()),
                ),
            },
            BackendEvent::Notice { level, message } => self.set_notice(level, message),
        }
    }

    fn handle_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::SubmissionStarted { .. } => {
                self.is_processing = true;
                self.progress_percent = 0;
                self.notice = None;
            }
            ProgressEvent::UploadProgress { percent } => {
                self.progress_percent = percent;
            }
            ProgressEvent::FileOutcome { result, .. } => {
                self.retrying.remove(&result.filename);
                let retryable = !result.is_success();
                let row = ResultRow::from_result(&result, false, retryable);
                match self
                    .results
                    .iter_mut()
                    .find(|r| r.filename == row.filename)
                {
                    Some(existing) => *existing = row,
                    None => self.results.push(row),
                }
                self.recompute_sorted_indices();
            }
            ProgressEvent::RetryPass { .. } => {
                self.is_processing = true;
                self.progress_percent = 0;
                self.rebuild_rows();
            }
        }
    }

    /// Rebuild the results rows from the cumulative report plus the
    /// retrying/tracked sets.
    fn rebuild_rows(&mut self) {
        let rows = match &self.report {
            Some(report) => report
                .results
                .iter()
                .map(|r| {
                    let retrying = !r.is_success() && self.retrying.contains(&r.filename);
                    let retryable = self.tracked.iter().any(|name| *name == r.filename);
                    ResultRow::from_result(r, retrying, retryable)
                })
                .collect(),
            None => Vec::new(),
        };
        self.results = rows;
        self.recompute_sorted_indices();
    }

    /// Render the current screen.
    pub fn view(&self, f: &mut ratatui::Frame) {
        match &self.screen {
            Screen::Queue => crate::view::queue::render(f, self),
            Screen::Results => crate::view::results::render(f, self),
            Screen::ResultDetail(idx) => crate::view::detail::render(f, self, *idx),
            Screen::Records => crate::view::records::render(f, self),
            Screen::RecordDetail(idx) => crate::view::records::render_detail(f, self, *idx),
        }

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }
}
