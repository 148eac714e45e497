//! Program command handlers
//!
//! Handles the program registry: uploading, listing, downloading, updating
//! and deleting programs.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use relay_client::OrchestratorClient;
use relay_core::domain::program::ProgramStatus;
use relay_core::dto::program::{ProgramSummary, UpdateProgram, UploadProgram};
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::id_resolver::resolve_program_id;

/// Program subcommands
#[derive(Subcommand)]
pub enum ProgramCommands {
    /// Upload a program file
    Upload {
        /// Path to the program file
        file: String,

        /// Display name (defaults to the generated id)
        #[arg(short, long)]
        name: Option<String>,

        /// Metadata as a JSON object
        #[arg(short, long, value_parser = parse_json)]
        metadata: Option<JsonValue>,
    },
    /// List all programs
    List,
    /// Download program data
    Download {
        /// Program ID or unambiguous prefix
        id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Update a program
    Update {
        /// Program ID or unambiguous prefix
        id: String,

        /// Replace the program data with this file
        #[arg(short, long)]
        file: Option<String>,

        /// New display name
        #[arg(short, long)]
        name: Option<String>,

        /// Replace metadata with this JSON object
        #[arg(short, long, value_parser = parse_json)]
        metadata: Option<JsonValue>,
    },
    /// Delete a program
    Delete {
        /// Program ID or unambiguous prefix
        id: String,
    },
}

pub(crate) fn parse_json(s: &str) -> Result<JsonValue> {
    serde_json::from_str(s).with_context(|| format!("invalid JSON: `{}`", s))
}

/// Handle program commands
pub async fn handle_program_command(command: ProgramCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        ProgramCommands::Upload {
            file,
            name,
            metadata,
        } => upload_program(&client, &file, name, metadata).await,
        ProgramCommands::List => list_programs(&client).await,
        ProgramCommands::Download { id, output } => {
            download_program(&client, &id, output.as_deref()).await
        }
        ProgramCommands::Update {
            id,
            file,
            name,
            metadata,
        } => update_program(&client, &id, file.as_deref(), name, metadata).await,
        ProgramCommands::Delete { id } => delete_program(&client, &id).await,
    }
}

fn read_program_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read program file: {}", path))
}

async fn upload_program(
    client: &OrchestratorClient,
    path: &str,
    name: Option<String>,
    metadata: Option<JsonValue>,
) -> Result<()> {
    let data = read_program_file(path)?;

    let id = client
        .upload_program(UploadProgram {
            name,
            metadata: metadata.unwrap_or_else(|| JsonValue::Object(Default::default())),
            data,
        })
        .await?;

    println!("{}", "✓ Program uploaded successfully!".green().bold());
    println!("  ID: {}", id.cyan());

    Ok(())
}

async fn list_programs(client: &OrchestratorClient) -> Result<()> {
    let programs = client.list_programs().await?;

    if programs.is_empty() {
        println!("{}", "No programs found.".yellow());
    } else {
        println!("{}", format!("Found {} program(s):", programs.len()).bold());
        println!();
        for program in programs {
            print_program_summary(&program);
        }
    }

    Ok(())
}

async fn download_program(
    client: &OrchestratorClient,
    id: &str,
    output: Option<&str>,
) -> Result<()> {
    let id = resolve_program_id(client, id).await?;
    let data = client.get_program_data(&id).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("Failed to write program to {}", path))?;
            println!(
                "{}",
                format!("✓ Wrote {} bytes to {}", data.len(), path).green()
            );
        }
        None => print!("{}", String::from_utf8_lossy(&data)),
    }

    Ok(())
}

async fn update_program(
    client: &OrchestratorClient,
    id: &str,
    file: Option<&str>,
    name: Option<String>,
    metadata: Option<JsonValue>,
) -> Result<()> {
    let id = resolve_program_id(client, id).await?;
    let data = file.map(read_program_file).transpose()?;

    client
        .update_program(
            &id,
            UpdateProgram {
                name,
                data,
                metadata,
            },
        )
        .await?;

    println!("{}", format!("✓ Program {} updated", id).green());

    Ok(())
}

async fn delete_program(client: &OrchestratorClient, id: &str) -> Result<()> {
    let id = resolve_program_id(client, id).await?;

    client.delete_program(&id).await?;

    println!("{}", format!("✓ Program {} deleted", id).green());

    Ok(())
}

fn print_program_summary(program: &ProgramSummary) {
    let status = match program.status {
        ProgramStatus::Active => program.status.to_string().green(),
        ProgramStatus::Inactive => program.status.to_string().dimmed(),
    };

    println!("  {} {}", "▸".cyan(), program.name.bold());
    println!("    ID:     {}", program.id.dimmed());
    println!("    Status: {}", status);
    if program.metadata.as_object().is_some_and(|m| !m.is_empty()) {
        println!("    Meta:   {}", program.metadata.to_string().dimmed());
    }
    println!();
}
