use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ratatui::crossterm::event;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod action;
mod app;
mod backend;
mod input;
mod model;
mod theme;
mod tui_event;
mod view;

use app::{App, Outbound};
use intake_core::{Config, ImportSession};
use intake_parser::ParserClient;
use tui_event::{BackendCommand, BackendEvent};

/// Intake TUI — bulk resume import dashboard for the parsing service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Resume files to queue on startup (max 10 per batch)
    files: Vec<PathBuf>,

    /// Base URL of the parsing service
    #[arg(long)]
    api_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Validate any file paths provided on the command line
    for path in &args.files {
        if !path.exists() {
            anyhow::bail!("file not found: {}", path.display());
        }
    }

    let config = Config::resolve(args.api_url.clone(), args.api_key.clone())?;
    let client = ParserClient::new(config.base_url.clone(), config.api_key.clone())?;
    let session = ImportSession::with_progress_tick(config.progress_tick());

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let mut app = App::new();

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(backend::run(session, client, cmd_rx, event_tx));

    if !args.files.is_empty() {
        let _ = cmd_tx.send(BackendCommand::AddFiles {
            paths: args.files.clone(),
        });
    }

    // Ctrl+C at the OS level cancels any in-flight submission
    let cancel_root = CancellationToken::new();
    let cancel_for_signal = cancel_root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    // Token of the submission currently in flight, if any
    let mut submit_cancel: Option<CancellationToken> = None;

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        // Draw
        terminal.draw(|f| app.view(f))?;

        // Poll for events with timeout for tick
        let timeout = tick_rate;

        tokio::select! {
            // Backend events (non-blocking drain)
            maybe_event = event_rx.recv() => {
                if let Some(backend_event) = maybe_event {
                    if matches!(backend_event, BackendEvent::SubmissionFinished { .. }) {
                        submit_cancel = None;
                    }
                    app.handle_backend_event(backend_event);
                    // Drain any additional queued backend events
                    while let Ok(evt) = event_rx.try_recv() {
                        if matches!(evt, BackendEvent::SubmissionFinished { .. }) {
                            submit_cancel = None;
                        }
                        app.handle_backend_event(evt);
                    }
                }
            }
            // Terminal input events
            _ = async {
                if event::poll(timeout).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let action = input::map_event(&evt);
                        if let Some(outbound) = app.update(action) {
                            dispatch(outbound, &cmd_tx, &cancel_root, &mut submit_cancel);
                        }
                    }
                }
            } => {}
        }

        // Process tick
        app.update(action::Action::Tick);

        if app.should_quit {
            cancel_root.cancel();
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

/// Turn a UI side effect into a backend command (or a token cancellation).
fn dispatch(
    outbound: Outbound,
    cmd_tx: &mpsc::UnboundedSender<BackendCommand>,
    cancel_root: &CancellationToken,
    submit_cancel: &mut Option<CancellationToken>,
) {
    match outbound {
        Outbound::Submit => {
            let token = cancel_root.child_token();
            *submit_cancel = Some(token.clone());
            let _ = cmd_tx.send(BackendCommand::Submit { cancel: token });
        }
        Outbound::Retry(filenames) => {
            let token = cancel_root.child_token();
            *submit_cancel = Some(token.clone());
            let _ = cmd_tx.send(BackendCommand::Retry {
                filenames,
                cancel: token,
            });
        }
        Outbound::RemoveFile(index) => {
            let _ = cmd_tx.send(BackendCommand::RemoveFile { index });
        }
        Outbound::LoadRecords => {
            let _ = cmd_tx.send(BackendCommand::LoadRecords);
        }
        Outbound::DeleteRecord(id) => {
            let _ = cmd_tx.send(BackendCommand::DeleteRecord { id });
        }
        Outbound::ExportReport => {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            let path = PathBuf::from(format!("intake-report-{stamp}.json"));
            let _ = cmd_tx.send(BackendCommand::ExportReport { path });
        }
        Outbound::CancelSubmission => {
            if let Some(token) = submit_cancel.take() {
                token.cancel();
            }
        }
    }
}
