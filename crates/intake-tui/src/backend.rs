use std::path::Path;

use bytes::Bytes;
use tokio::sync::mpsc;

use intake_core::{ImportSession, IncomingFile, SubmitOutcome};
use intake_parser::ParserClient;

use crate::tui_event::{BackendCommand, BackendEvent, NoticeLevel, QueueEntry};

/// Backend task: owns the session and the service client, processes
/// commands serially and reports every state change back as events.
///
/// Submissions are awaited inline, which serializes them structurally;
/// cancellation comes from the UI side through the token carried in the
/// command, so no command needs to preempt another.
pub async fn run(
    mut session: ImportSession,
    client: ParserClient,
    mut commands: mpsc::UnboundedReceiver<BackendCommand>,
    events: mpsc::UnboundedSender<BackendEvent>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            BackendCommand::AddFiles { paths } => {
                add_files(&mut session, &paths, &events).await;
            }
            BackendCommand::RemoveFile { index } => {
                session.remove_file(index);
                send_queue(&session, &events);
            }
            BackendCommand::Submit { cancel } => {
                let progress = progress_sender(&events);
                match session.submit(&client, progress, cancel).await {
                    Ok(outcome) => {
                        finish(&session, outcome, Vec::new(), &events);
                    }
                    Err(err) => notice(&events, NoticeLevel::Error, err.to_string()),
                }
            }
            BackendCommand::Retry { filenames, cancel } => {
                let progress = progress_sender(&events);
                match session
                    .resubmit(&filenames, &client, progress, cancel)
                    .await
                {
                    Ok(summary) => match summary.outcome {
                        Some(outcome) => finish(&session, outcome, summary.stale, &events),
                        None => {
                            for name in &summary.stale {
                                notice(
                                    &events,
                                    NoticeLevel::Warn,
                                    format!("{name}: file no longer available, re-upload manually"),
                                );
                            }
                        }
                    },
                    Err(err) => notice(&events, NoticeLevel::Error, err.to_string()),
                }
            }
            BackendCommand::LoadRecords => {
                let result = client.list_resumes().await.map_err(|e| e.to_string());
                let _ = events.send(BackendEvent::RecordsLoaded { result });
            }
            BackendCommand::DeleteRecord { id } => {
                let error = client.delete_resume(id).await.err().map(|e| e.to_string());
                let _ = events.send(BackendEvent::RecordDeleted { id, error });
            }
            BackendCommand::ExportReport { path } => {
                match session.report() {
                    Some(report) => {
                        let error = intake_reporting::export_results(
                            report,
                            &path,
                            intake_reporting::ExportFormat::Json,
                        )
                        .err()
                        .map(|e| e.to_string());
                        let _ = events.send(BackendEvent::ReportExported { path, error });
                    }
                    None => notice(&events, NoticeLevel::Warn, "no report to export yet".into()),
                }
            }
        }
    }
}

async fn add_files(
    session: &mut ImportSession,
    paths: &[std::path::PathBuf],
    events: &mpsc::UnboundedSender<BackendEvent>,
) {
    let mut incoming = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(payload) => incoming.push(IncomingFile {
                name: display_name(path),
                payload: Bytes::from(payload),
                declared_mime: None,
            }),
            Err(err) => notice(
                events,
                NoticeLevel::Error,
                format!("{}: {err}", path.display()),
            ),
        }
    }

    match session.add_files(incoming) {
        Ok(admission) => {
            for rejected in &admission.rejected {
                notice(
                    events,
                    NoticeLevel::Warn,
                    format!("{} rejected: {}", rejected.name, rejected.reason),
                );
            }
        }
        Err(err) => notice(events, NoticeLevel::Error, err.to_string()),
    }
    send_queue(session, events);
}

/// Emit the post-submission state in one burst.
fn finish(
    session: &ImportSession,
    outcome: SubmitOutcome,
    stale: Vec<String>,
    events: &mpsc::UnboundedSender<BackendEvent>,
) {
    let _ = events.send(BackendEvent::SubmissionFinished { outcome, stale });
    send_queue(session, events);
    let _ = events.send(BackendEvent::TrackerChanged {
        tracked: session.recovery().tracked_names(),
    });
    if let Some(report) = session.report() {
        let _ = events.send(BackendEvent::ReportChanged {
            report: report.clone(),
        });
    }
}

fn send_queue(session: &ImportSession, events: &mpsc::UnboundedSender<BackendEvent>) {
    let files = session
        .queue()
        .iter()
        .map(|f| QueueEntry {
            name: f.name.clone(),
            size: f.size(),
            mime: f.mime,
        })
        .collect();
    let _ = events.send(BackendEvent::QueueChanged { files });
}

fn progress_sender(
    events: &mpsc::UnboundedSender<BackendEvent>,
) -> impl Fn(intake_core::ProgressEvent) + Send + Sync {
    let events = events.clone();
    move |event| {
        let _ = events.send(BackendEvent::Progress(event));
    }
}

fn notice(events: &mpsc::UnboundedSender<BackendEvent>, level: NoticeLevel, message: String) {
    let _ = events.send(BackendEvent::Notice { level, message });
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
