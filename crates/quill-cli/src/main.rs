use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use quill_cli::{
    config::Config,
    logging::init_logging,
    view::{TerminalView, Update},
};
use quill_session::{HttpTransport, SessionController, SessionState, StreamDriver};
use quill_types::Policy;

/// Stream a multi-agent email generation session to the terminal
#[derive(Debug, Parser)]
#[command(name = "quill", version)]
struct Args {
    /// Instruction sent to the generation endpoint
    instruction: String,

    /// Override the endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Aggregation policy: live-stream, snapshot or tool-log
    #[arg(long)]
    policy: Option<Policy>,

    /// Read configuration from this file instead of config/
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every snapshot as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?
    .with_overrides(args.endpoint.clone(), args.policy);

    init_logging(&config.logging);

    tracing::info!(
        endpoint = %config.server.endpoint,
        policy = ?config.session.policy,
        "Starting session"
    );

    let transport = HttpTransport::builder()
        .endpoint(config.server.endpoint.as_str())
        .connect_timeout(config.server.connect_timeout())
        .build()?;
    let controller = SessionController::new(StreamDriver::new(
        Arc::new(transport),
        config.session.clone(),
    ));

    let mut snapshots = controller.subscribe_events();
    let handle = controller.submit(args.instruction);
    let mut view = TerminalView::new();
    let mut interrupted = false;
    let mut last = controller.current();

    loop {
        tokio::select! {
            next = snapshots.recv() => {
                let Some(state) = next else {
                    break;
                };
                if args.json {
                    println!("{}", serde_json::to_string(&state)?);
                } else {
                    emit(view.update(&state))?;
                }
                let terminated = state.is_terminated();
                last = state;
                if terminated {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                tracing::info!("Interrupted, cancelling session");
                interrupted = true;
                controller.cancel();
            }
        }
    }

    handle.await.context("Session task failed")?;

    Ok(exit_code(&last, interrupted))
}

fn emit(updates: Vec<Update>) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for update in updates {
        match update {
            Update::Content(text) => write!(stdout, "{}", text)?,
            Update::Status(line) => {
                stdout.flush()?;
                eprintln!("{}", line);
            }
        }
    }
    stdout.flush()
}

fn exit_code(state: &SessionState, interrupted: bool) -> ExitCode {
    if state.error().is_some() {
        ExitCode::FAILURE
    } else if interrupted {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    }
}
