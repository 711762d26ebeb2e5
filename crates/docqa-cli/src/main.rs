//! Document Q&A CLI - interactive chat front-end
//!
//! A thin REPL over the docqa-core session store. Queries stream their
//! answers word by word; slash commands cover attachments, credits,
//! history, and session management.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::broadcast;

use docqa_core::{
    Attachment, Config, CreditLedger, Error, MockBackend, Phase, SessionEvent, SessionStore,
    UseCaseStore, UseCaseUpdate,
};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Document Q&A assistant (simulated backend)", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inter-token streaming delay in milliseconds
    #[arg(long)]
    stream_delay_ms: Option<u64>,

    /// Simulated backend latency unit in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Allow submissions without attachments
    #[arg(long)]
    allow_text_only: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

const HELP: &str = "\
Commands:
  /attach <name>...   stage one or more attachments
  /files              list staged attachments
  /remove <name>      unstage an attachment
  /new                start a fresh session
  /regen              regenerate the previous answer
  /credits            refresh and show the credit balance
  /history            show recorded exchanges as JSON
  /usecase            show the configured use case details
  /usecase pipeline <name>   rename the pipeline
  /help               show this help
  /quit               exit
Anything else is submitted as a query.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Warn by default so log lines do not fight the prompt
    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "info,docqa_core=debug"
        } else {
            "warn"
        })
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(ms) = cli.stream_delay_ms {
        config.session.stream_delay_ms = ms;
    }
    if let Some(ms) = cli.latency_ms {
        config.backend.latency_ms = ms;
    }
    if cli.allow_text_only {
        config.session.require_attachments = false;
    }

    let backend = Arc::new(MockBackend::new(&config.backend));
    let ledger = Arc::new(CreditLedger::new(backend.clone()));
    let store = Arc::new(SessionStore::new(
        backend.clone(),
        ledger.clone(),
        config.session.clone(),
    ));
    let usecases = UseCaseStore::new(backend);

    let details = usecases.fetch_details().await?;
    println!(
        "{} {} ({} / {})",
        style("Welcome to").dim(),
        style(&details.use_case).bold(),
        details.pipeline,
        details.version
    );
    println!("{}", style("Type /help for commands.").dim());

    tokio::spawn(print_stream(store.subscribe()));

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("docqa> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                if line == "/quit" || line == "/exit" {
                    break;
                }
                handle_line(&line, &store, &ledger, &usecases).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", style("Input error:").red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Print streamed answer deltas as they arrive
async fn print_stream(mut events: broadcast::Receiver<SessionEvent>) {
    let mut printed = 0usize;
    loop {
        match events.recv().await {
            Ok(SessionEvent::StreamUpdate { content }) => {
                if printed <= content.len() {
                    print!("{}", &content[printed..]);
                    let _ = std::io::stdout().flush();
                }
                printed = content.len();
            }
            Ok(SessionEvent::PhaseChanged(Phase::Idle)) | Ok(SessionEvent::Reset) => {
                if printed > 0 {
                    println!();
                    printed = 0;
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn handle_line(
    line: &str,
    store: &SessionStore,
    ledger: &CreditLedger,
    usecases: &UseCaseStore,
) {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("/help") => println!("{HELP}"),
        Some("/attach") => {
            let names: Vec<&str> = parts.collect();
            if names.is_empty() {
                eprintln!("{}", style("Usage: /attach <name>...").yellow());
                return;
            }
            store.select_files(names.iter().map(|name| Attachment::new(*name)));
            println!("{} attachment(s) staged", store.pending().len());
        }
        Some("/files") => {
            let pending = store.pending();
            if pending.is_empty() {
                println!("{}", style("No attachments staged.").dim());
            }
            for file in pending {
                println!("  {}", file.name);
            }
        }
        Some("/remove") => match parts.next() {
            Some(name) => {
                if store.remove_file(&Attachment::new(name)) {
                    println!("Removed {name}");
                } else {
                    eprintln!("{} no staged attachment matches {name}", style("Note:").yellow());
                }
            }
            None => eprintln!("{}", style("Usage: /remove <name>").yellow()),
        },
        Some("/new") => {
            store.reset();
            println!("{}", style("Started a new session.").dim());
        }
        Some("/regen") => {
            if let Err(e) = store.regenerate().await {
                report(&e);
            }
            settle().await;
        }
        Some("/credits") => match ledger.refresh().await {
            Ok(balance) => println!("Credits remaining: {balance}"),
            Err(e) => report(&e),
        },
        Some("/history") => match usecases.fetch_history().await {
            Ok(history) => match serde_json::to_string_pretty(&history) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{} {}", style("Error:").red(), e),
            },
            Err(e) => report(&e),
        },
        Some("/usecase") => {
            let update = match (parts.next(), parts.next()) {
                (Some("pipeline"), Some(name)) => Some(UseCaseUpdate {
                    pipeline: Some(name.to_string()),
                    ..UseCaseUpdate::default()
                }),
                (None, _) => None,
                _ => {
                    eprintln!("{}", style("Usage: /usecase [pipeline <name>]").yellow());
                    return;
                }
            };
            let result = match update {
                Some(update) => usecases.update_details(update).await,
                None => usecases.fetch_details().await,
            };
            match result {
                Ok(details) => println!(
                    "{} / {} / {}",
                    details.use_case, details.pipeline, details.version
                ),
                Err(e) => report(&e),
            }
        }
        Some(cmd) if cmd.starts_with('/') => {
            eprintln!("{} unknown command {cmd}", style("Note:").yellow());
        }
        _ => {
            if let Err(e) = store.submit(line, store.pending()).await {
                report(&e);
            }
            settle().await;
        }
    }
}

/// Give the stream printer a moment to flush the tail of an answer
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn report(error: &Error) {
    // Recoverable errors left no state behind; the user just retries
    if error.is_recoverable() {
        eprintln!("{} {error}", style("Retry:").yellow());
    } else {
        eprintln!("{} {error}", style("Error:").red());
    }
}
