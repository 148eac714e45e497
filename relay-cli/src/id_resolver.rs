//! ID resolver module
//!
//! Lets users name a program by an unambiguous prefix of its id instead of the
//! full id.

use anyhow::{Context, Result, anyhow};
use relay_client::OrchestratorClient;

/// Resolve a program id or prefix to a full program id
///
/// # Errors
/// Returns an error if no program or more than one program matches, or if the
/// program list cannot be fetched.
pub async fn resolve_program_id(client: &OrchestratorClient, id_or_prefix: &str) -> Result<String> {
    let programs = client
        .list_programs()
        .await
        .context("Failed to fetch programs for ID resolution")?;

    let ids: Vec<&str> = programs.iter().map(|p| p.id.as_str()).collect();
    match_prefix(&ids, id_or_prefix)
}

fn match_prefix(ids: &[&str], id_or_prefix: &str) -> Result<String> {
    let prefix = id_or_prefix.to_lowercase();

    if ids.contains(&prefix.as_str()) {
        return Ok(prefix);
    }

    let matches: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| id.to_lowercase().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No program found with ID starting with '{}'", prefix)),
        [id] => Ok(id.to_string()),
        _ => Err(anyhow!(
            "Ambiguous prefix '{}' matches multiple programs: {}",
            prefix,
            matches.join(", ")
        )),
    }
}
