//! Relay CLI
//!
//! Command-line interface for interacting with the Relay orchestrator.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, DEFAULT_ORCHESTRATOR_URL};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Relay remote job execution CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL; `host:port` is accepted and assumed to be http
    #[arg(long, env = "RELAY_ORCHESTRATOR_URL", default_value = DEFAULT_ORCHESTRATOR_URL)]
    orchestrator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::new(&cli.orchestrator_url)?;

    handle_command(cli.command, &config).await
}
