//! Job command handlers
//!
//! Handles submitting, inspecting and cancelling jobs, and reading their
//! result messages.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use relay_client::{MessageCursor, OrchestratorClient};
use relay_core::domain::job::{CancelOutcome, Job, JobStatus, StatusChange};
use relay_core::dto::message::MessageEntry;
use serde_json::{Map, Value as JsonValue};
use std::time::Duration;
use uuid::Uuid;

use super::program::parse_json;
use crate::config::Config;
use crate::id_resolver::resolve_program_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job running a program
    Submit {
        /// Program ID or unambiguous prefix
        program: String,

        /// Inputs as a JSON object
        #[arg(long, value_parser = parse_json)]
        inputs: Option<JsonValue>,

        /// Single inputs as key=value pairs (e.g., shots=100 backend=sim)
        #[arg(short, long, value_parser = parse_key_val)]
        input: Vec<(String, JsonValue)>,
    },
    /// Get job details
    Get { id: Uuid },
    /// Get job status
    Status { id: Uuid },
    /// Cancel a job
    Cancel { id: Uuid },
    /// Show result messages of a job
    Results {
        id: Uuid,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        follow: bool,

        /// Polling interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval: u64,
    },
    /// Report a job status, as an execution unit would
    Report { id: Uuid, status: JobStatus },
    /// Delete all result messages of a job
    DeleteMessages { id: Uuid },
}

/// Parse a single key=value pair; the value is JSON when it parses as JSON
fn parse_key_val(s: &str) -> Result<(String, JsonValue)> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    let value =
        serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Merge `--inputs` with the `--input` pairs, pairs taking precedence
fn build_inputs(inputs: Option<JsonValue>, pairs: Vec<(String, JsonValue)>) -> Result<JsonValue> {
    let mut map = match inputs {
        None => Map::new(),
        Some(JsonValue::Object(map)) => map,
        Some(_) if !pairs.is_empty() => {
            anyhow::bail!("--inputs must be a JSON object when combined with --input")
        }
        Some(other) => return Ok(other),
    };

    map.extend(pairs);
    Ok(JsonValue::Object(map))
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::Submit {
            program,
            inputs,
            input,
        } => submit_job(&client, &program, build_inputs(inputs, input)?).await,
        JobCommands::Get { id } => get_job(&client, id).await,
        JobCommands::Status { id } => get_status(&client, id).await,
        JobCommands::Cancel { id } => cancel_job(&client, id).await,
        JobCommands::Results {
            id,
            follow,
            interval,
        } => show_results(&client, id, follow, Duration::from_millis(interval)).await,
        JobCommands::Report { id, status } => report_status(&client, id, status).await,
        JobCommands::DeleteMessages { id } => delete_messages(&client, id).await,
    }
}

async fn submit_job(client: &OrchestratorClient, program: &str, inputs: JsonValue) -> Result<()> {
    let program_id = resolve_program_id(client, program).await?;

    let job = client.submit_job(&program_id, inputs).await?;

    println!("{}", "✓ Job submitted successfully!".green().bold());
    println!("  Job ID: {}", job.job_id.to_string().cyan());
    println!("  Unit:   {}", job.execution_unit_name.dimmed());

    Ok(())
}

async fn get_job(client: &OrchestratorClient, id: Uuid) -> Result<()> {
    let job = client.get_job(id).await?;

    print_job_details(&job);

    Ok(())
}

async fn get_status(client: &OrchestratorClient, id: Uuid) -> Result<()> {
    let status = client.get_job_status(id).await?;

    println!("{}", colorize_status(&status));

    Ok(())
}

async fn cancel_job(client: &OrchestratorClient, id: Uuid) -> Result<()> {
    match client.cancel_job(id).await? {
        CancelOutcome::Canceled => println!("{}", format!("✓ Job {} canceled", id).green()),
        CancelOutcome::AlreadyTerminal { status } => println!(
            "{} already finished: {}",
            format!("Job {}", id).yellow(),
            colorize_status(&status)
        ),
    }

    Ok(())
}

async fn report_status(client: &OrchestratorClient, id: Uuid, status: JobStatus) -> Result<()> {
    match client.report_status(id, status).await? {
        StatusChange::Updated => println!("✓ Job {} is now {}", id, colorize_status(&status)),
        StatusChange::Unchanged => println!(
            "{}",
            format!("Job {} was already {}", id, status).dimmed()
        ),
    }

    Ok(())
}

async fn delete_messages(client: &OrchestratorClient, id: Uuid) -> Result<()> {
    let deleted = client.delete_messages(id).await?;

    println!(
        "{}",
        format!("✓ Deleted {} message(s) of job {}", deleted, id).green()
    );

    Ok(())
}

/// Print result messages, optionally polling until the job is terminal
async fn show_results(
    client: &OrchestratorClient,
    id: Uuid,
    follow: bool,
    interval: Duration,
) -> Result<()> {
    let mut cursor = MessageCursor::new(id);

    let first = cursor.poll(client).await?;
    if first.is_empty() && !follow {
        println!("{}", "No results found for this job.".yellow());
        return Ok(());
    }
    first.iter().for_each(print_message);

    if !follow {
        return Ok(());
    }

    loop {
        // Read status before draining so messages sent just before the final
        // report are still printed
        let status = client.get_job_status(id).await?;

        cursor.poll(client).await?.iter().for_each(print_message);

        if status.is_terminal() {
            println!("{} {}", "Job finished:".bold(), colorize_status(&status));
            return Ok(());
        }

        tokio::time::sleep(interval).await;
    }
}

fn print_message(message: &MessageEntry) {
    println!(
        "{} {}",
        message
            .timestamp
            .format("%H:%M:%S%.6f")
            .to_string()
            .dimmed(),
        String::from_utf8_lossy(&message.payload)
    );
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:         {}", job.id.to_string().cyan());
    println!("  Program ID: {}", job.program_id.dimmed());
    println!("  Status:     {}", colorize_status(&job.status));
    println!("  Unit:       {}", job.execution_unit_name);
    println!(
        "  Created:    {}",
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:    {}",
        job.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Creating => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Canceled => status_str.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("shots=100").unwrap(),
            ("shots".to_string(), json!(100))
        );
        assert_eq!(
            parse_key_val("backend=sim").unwrap(),
            ("backend".to_string(), json!("sim"))
        );
        assert!(parse_key_val("shots").is_err());
    }

    #[test]
    fn test_build_inputs_merges_pairs() {
        let inputs = build_inputs(
            Some(json!({ "shots": 10, "backend": "sim" })),
            vec![("shots".to_string(), json!(100))],
        )
        .unwrap();

        assert_eq!(inputs, json!({ "shots": 100, "backend": "sim" }));
    }

    #[test]
    fn test_build_inputs_defaults_to_empty_object() {
        assert_eq!(build_inputs(None, vec![]).unwrap(), json!({}));
    }

    #[test]
    fn test_build_inputs_keeps_non_object_without_pairs() {
        assert_eq!(build_inputs(Some(json!([1, 2])), vec![]).unwrap(), json!([1, 2]));
        assert!(build_inputs(Some(json!([1, 2])), vec![("a".to_string(), json!(1))]).is_err());
    }
}
