//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod program;

pub use job::JobCommands;
pub use program::ProgramCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Program registry
    Program {
        #[command(subcommand)]
        command: ProgramCommands,
    },
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Route a command to its handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Program { command } => program::handle_program_command(command, config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
    }
}
