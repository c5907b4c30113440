mod bootstrap;
mod commands;

use crate::bootstrap::{config, logging, storage};
use crate::commands::Command;
use anyhow::Result;
use clap::Parser;
use oss_events::{AppEvent, EventBus};
use std::process::ExitCode;

/// Exit status when a command fails (1 is reserved for `exists` misses)
const EXIT_ERROR: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "oss", version, about = "Local, S3 and GCS file storage behind one interface")]
struct Cli {
    /// Configuration file (defaults to $OSS_CONFIG, then ./oss.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print command results
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.verbose);

    let events = EventBus::new(cli.quiet);
    events.emit(AppEvent::Starting);

    match run(cli, &events).await {
        Ok(code) => code,
        Err(e) => {
            events.emit(AppEvent::Error {
                context: "oss".to_string(),
                error: format!("{:#}", e),
            });
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli, events: &std::sync::Arc<EventBus>) -> Result<ExitCode> {
    let config_path = cli
        .config
        .or_else(|| std::env::var("OSS_CONFIG").ok())
        .unwrap_or_else(|| "oss.toml".to_string());

    let config = config::load(&config_path, events).await?;
    let store = storage::initialize(&config, events).await?;

    let status = commands::execute(cli.command, store.as_ref(), events).await?;
    Ok(status.into())
}
