//! # QR Pay Terminal
//!
//! Interactive till: type products, watch the total, and get a payment QR
//! for the running total written to disk.
//!
//! ## Event Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Single-threaded select! loop                         │
//! │                                                                         │
//! │   stdin line ──► Command ──► PosSession (ledger + effects)             │
//! │                                                                         │
//! │   remote completion ──► coordinator applies it ──► QR file updated     │
//! │                                                                         │
//! │   diagnostic ──► printed                                               │
//! │                                                                         │
//! │   quit / EOF ──► settle (bounded) ──► teardown                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod render;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use qrpay_sync::{
    ChannelEmitter, ClientConfig, Completion, Diagnostic, PosSession, Transition,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP};

/// How long `quit` waits for requests still in flight.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "qrpay")]
#[command(about = "Till front end that keeps a payment QR in sync with the running total")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Service URL, overrides the config file and environment
    #[arg(long)]
    base_url: Option<String>,

    /// Deployment environment: development or production
    #[arg(long)]
    env: Option<String>,

    /// Ordering policy: discard_stale or last_resolved_wins
    #[arg(long)]
    ordering: Option<String>,

    /// Where to write the current QR image
    #[arg(long)]
    qr_output: Option<PathBuf>,
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Completion(Completion),
    Diagnostic(Diagnostic),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let symbol = config.display.currency_symbol.clone();

    let (emitter, mut diagnostics) = ChannelEmitter::new();
    let mut session = PosSession::connect(&config, emitter).context("failed to start session")?;

    println!("QR Pay - type 'help' for commands");
    prompt();

    let input = BufReader::new(tokio::io::stdin());
    let result = run(&mut session, &config, &mut diagnostics, input).await;

    println!("{}", render::total_line(session.ledger().total(), &symbol));
    result
}

/// Drives the session from `input` until quit, EOF or a read error. The
/// session is settled and torn down on every exit path.
async fn run<R>(
    session: &mut PosSession,
    config: &ClientConfig,
    diagnostics: &mut UnboundedReceiver<Diagnostic>,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let symbol = &config.display.currency_symbol;
    let mut written_seq = None;
    let mut lines = input.lines();

    let result = loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            Some(completion) = session.next_completion() => Input::Completion(completion),
            Some(diagnostic) = diagnostics.recv() => Input::Diagnostic(diagnostic),
        };

        match input {
            Input::Line(line) => {
                let line = match line.context("failed to read stdin") {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break Ok(()),
                    Ok(Some(command)) => run_command(session, command, symbol),
                    Ok(None) => {}
                    Err(e) => println!("error: {}", e),
                }
                prompt();
            }
            Input::Completion(Completion::Qr(Transition::Displayed { .. })) => {
                if publish_qr(session, config, &mut written_seq).await {
                    prompt();
                }
            }
            Input::Completion(completion) => debug!(?completion, "Remote call finished"),
            Input::Diagnostic(diagnostic) => {
                if print_diagnostic(&diagnostic) {
                    prompt();
                }
            }
        }
    };

    shutdown(session, config, &mut written_seq).await;
    while let Ok(diagnostic) = diagnostics.try_recv() {
        print_diagnostic(&diagnostic);
    }

    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,qrpay=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file and `QRPAY_*` variables first, then command-line flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.clone()).context("failed to load config")?;

    if let Some(env) = &cli.env {
        config.service.environment = env.parse()?;
    }
    if let Some(url) = &cli.base_url {
        config.service.base_url = Some(url.clone());
    }
    if let Some(ordering) = &cli.ordering {
        config.display.ordering = ordering.parse()?;
    }
    if let Some(path) = &cli.qr_output {
        config.display.qr_output_path = Some(path.clone());
    }

    config.validate()?;
    info!(
        environment = %config.service.environment,
        base_url = %config.base_url()?,
        "Configuration loaded"
    );
    Ok(config)
}

fn run_command(session: &mut PosSession, command: Command, symbol: &str) {
    match command {
        Command::SetName(name) => session.set_draft_name(name),
        Command::SetPrice(price) => session.set_draft_price(price),
        Command::AddDraft => {
            let event = session.submit_draft();
            println!("{}", render::total_line(event.total, symbol));
        }
        Command::Add { name, price } => {
            let event = session.add_product(name, price);
            println!("{}", render::total_line(event.total, symbol));
        }
        Command::List => println!("{}", render::product_list(session.ledger(), symbol)),
        Command::Total => println!("{}", render::total_line(session.ledger().total(), symbol)),
        Command::Status => println!("{}", render::status(&session.coordinator().status(), symbol)),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

/// Writes the displayed QR to the configured file if it changed since the
/// last write. Returns true if anything was printed.
async fn publish_qr(session: &PosSession, config: &ClientConfig, written_seq: &mut Option<u64>) -> bool {
    let Some(artifact) = session.coordinator().displayed() else {
        return false;
    };
    if *written_seq == Some(artifact.seq) {
        return false;
    }

    let symbol = &config.display.currency_symbol;
    match &config.display.qr_output_path {
        Some(path) => match tokio::fs::write(path, &artifact.image.bytes).await {
            Ok(()) => {
                *written_seq = Some(artifact.seq);
                println!(
                    "\nQR for {} written to {}",
                    artifact.total.format_with_symbol(symbol),
                    path.display()
                );
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write QR image");
                return false;
            }
        },
        None => {
            *written_seq = Some(artifact.seq);
            println!(
                "\nQR for {} ready ({}, {} bytes)",
                artifact.total.format_with_symbol(symbol),
                artifact.id(),
                artifact.image.len()
            );
        }
    }
    true
}

/// Prints what the cashier should know about. Returns true if anything was printed.
fn print_diagnostic(diagnostic: &Diagnostic) -> bool {
    match diagnostic {
        Diagnostic::PushSucceeded { .. }
        | Diagnostic::PushSuperseded { .. }
        | Diagnostic::Displayed { .. } => false,
        other => {
            println!("\n  [{}]", other);
            true
        }
    }
}

/// Gives outstanding requests a bounded amount of time, then releases everything.
async fn shutdown(session: &mut PosSession, config: &ClientConfig, written_seq: &mut Option<u64>) {
    if session.coordinator().has_pending() {
        println!("waiting for pending requests...");
        match tokio::time::timeout(SETTLE_TIMEOUT, session.settle()).await {
            Ok(completions) => debug!(count = completions.len(), "Outstanding requests settled"),
            Err(_) => warn!(timeout = ?SETTLE_TIMEOUT, "Gave up waiting for outstanding requests"),
        }
        publish_qr(session, config, written_seq).await;
    }

    if session.teardown() {
        debug!("Displayed QR released");
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
