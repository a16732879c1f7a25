use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use tokio_util::sync::CancellationToken;

use intake_core::{
    Config, FileStatus, ImportSession, IncomingFile, ProgressEvent, SubmitOutcome,
};
use intake_parser::ParserClient;
use intake_reporting::ExportFormat;

/// Bulk resume importer - submit resumes to the parsing service in one batch
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Resume files to import (max 10 per batch)
    files: Vec<PathBuf>,

    /// Base URL of the parsing service
    #[arg(long)]
    api_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long)]
    api_key: Option<String>,

    /// Keep only the first N admitted files (drops from the tail)
    #[arg(long, value_name = "N")]
    take: Option<usize>,

    /// After the first pass, resubmit all failed files once
    #[arg(long)]
    retry_failed: bool,

    /// Write the final report to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export format for --output (json or text)
    #[arg(long, default_value = "text")]
    format: ExportFormat,

    /// List previously parsed records instead of importing
    #[arg(long)]
    list: bool,

    /// Delete one persisted record by id
    #[arg(long, value_name = "ID")]
    delete: Option<i64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.no_color {
        owo_colors::set_override(false);
    }

    let config = Config::resolve(args.api_url.clone(), args.api_key.clone())?;
    let client = ParserClient::new(config.base_url.clone(), config.api_key.clone())?;

    if let Some(id) = args.delete {
        client.delete_resume(id).await?;
        println!("Deleted record {id}");
        return Ok(());
    }
    if args.list {
        return list_records(&client).await;
    }
    if args.files.is_empty() {
        anyhow::bail!("no files given (see --help)");
    }
    for path in &args.files {
        if !path.exists() {
            anyhow::bail!("file not found: {}", path.display());
        }
    }

    let mut session = ImportSession::with_progress_tick(config.progress_tick());

    let mut incoming = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let payload = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        incoming.push(IncomingFile {
            name,
            payload: Bytes::from(payload),
            declared_mime: None,
        });
    }

    let admission = session.add_files(incoming)?;
    for rejected in &admission.rejected {
        eprintln!(
            "{} {} ({})",
            "skipped".if_supports_color(Stream::Stderr, |t| t.yellow()),
            rejected.name,
            rejected.reason
        );
    }
    if let Some(n) = args.take {
        session.reduce_queue_to(n);
    }
    if session.queue().is_empty() {
        anyhow::bail!("no admissible files in the batch");
    }

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    let bar = submission_bar();
    let outcome = session
        .submit(&client, progress_for(&bar), cancel.clone())
        .await?;
    bar.finish_and_clear();

    match &outcome {
        SubmitOutcome::Cancelled => {
            println!("Submission cancelled; queue left as it was.");
            return Ok(());
        }
        SubmitOutcome::TransportFailed { error } => {
            eprintln!(
                "{} {error}",
                "transport failure:".if_supports_color(Stream::Stderr, |t| t.red())
            );
        }
        SubmitOutcome::Completed => {}
    }

    if args.retry_failed {
        let failed = session
            .report()
            .map(|r| r.failed_filenames())
            .unwrap_or_default();
        if !failed.is_empty() {
            println!("Retrying {} failed file(s)...", failed.len());
            let bar = submission_bar();
            let summary = session
                .resubmit(&failed, &client, progress_for(&bar), cancel.clone())
                .await?;
            bar.finish_and_clear();
            for name in &summary.stale {
                eprintln!("{name}: file no longer available, re-upload manually");
            }
            if let Some(SubmitOutcome::Cancelled) = summary.outcome {
                println!("Retry cancelled.");
            }
        }
    }

    let Some(report) = session.report() else {
        return Ok(());
    };

    print_summary(report);

    if let Some(path) = &args.output {
        intake_reporting::export_results(report, path, args.format)?;
        println!("Report written to {}", path.display());
    }

    // Scripting-friendly: any remaining failure is a non-zero exit.
    if report.failed_files > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn submission_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    bar
}

/// Bridge core progress events onto the indicatif bar.
fn progress_for(bar: &ProgressBar) -> impl Fn(ProgressEvent) + Send + Sync {
    let bar = bar.clone();
    move |event| match event {
        ProgressEvent::SubmissionStarted { file_count } => {
            bar.set_message(format!("uploading {file_count} file(s)"));
        }
        ProgressEvent::UploadProgress { percent } => {
            bar.set_position(u64::from(percent));
        }
        ProgressEvent::FileOutcome { result, .. } => {
            bar.set_message(format!("processed {}", result.filename));
        }
        ProgressEvent::RetryPass { count } => {
            bar.set_message(format!("retrying {count} file(s)"));
        }
    }
}

fn print_summary(report: &intake_core::BatchReport) {
    println!();
    println!(
        "{} total, {} parsed, {} failed ({:.2}s server time)",
        report.total_files,
        report
            .successful_files
            .if_supports_color(Stream::Stdout, |t| t.green()),
        report
            .failed_files
            .if_supports_color(Stream::Stdout, |t| t.red()),
        report.total_processing_time
    );

    for result in &report.results {
        match result.status {
            FileStatus::Success => {
                let time = result
                    .processing_time
                    .map(|t| format!(" ({t:.2}s)"))
                    .unwrap_or_default();
                println!(
                    "  {} {}{time}",
                    "ok    ".if_supports_color(Stream::Stdout, |t| t.green()),
                    result.filename
                );
            }
            FileStatus::Failed => {
                println!(
                    "  {} {} - {}",
                    "FAILED".if_supports_color(Stream::Stdout, |t| t.red()),
                    result.filename,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

async fn list_records(client: &ParserClient) -> anyhow::Result<()> {
    let records = client.list_resumes().await?;
    if records.is_empty() {
        println!("No parsed resumes on record.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<24}  {:<20}  {:<26}  {:<10}  CREATED",
        "ID", "FILE", "CANDIDATE", "EMAIL", "EXPERIENCE"
    );
    for record in &records {
        println!(
            "{:>6}  {:<24}  {:<20}  {:<26}  {:<10}  {}",
            record.id,
            record.filename.as_deref().unwrap_or("N/A"),
            record.candidate_name.as_deref().unwrap_or("N/A"),
            record.candidate_email.as_deref().unwrap_or("N/A"),
            record.total_experience.as_deref().unwrap_or("N/A"),
            record.created_at.as_deref().unwrap_or("N/A"),
        );
    }
    Ok(())
}
