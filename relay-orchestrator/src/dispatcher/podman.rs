//! Podman dispatcher
//!
//! Runs each execution unit as a detached podman container named after the
//! unit. The container receives its job through environment variables and
//! reports back to the orchestrator over HTTP:
//! - `RELAY_JOB_ID`: job to report status and messages for
//! - `RELAY_PROGRAM_ID`: program to download from the registry
//! - `RELAY_INPUTS`: job inputs as JSON
//! - `RELAY_ORCHESTRATOR_URL`: where to report

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::{DispatchError, Dispatcher, LaunchRequest};

/// Podman dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodmanConfig {
    /// Executor image every unit runs
    pub image: String,

    /// Orchestrator URL as reachable from inside a container
    pub orchestrator_url: String,

    /// Optional podman network to attach units to
    pub network: Option<String>,
}

/// Dispatcher that shells out to the `podman` CLI
#[derive(Debug, Clone)]
pub struct PodmanDispatcher {
    config: PodmanConfig,
}

impl PodmanDispatcher {
    pub fn new(config: PodmanConfig) -> Self {
        Self { config }
    }

    /// Arguments of the `podman run` invocation for a unit
    fn launch_args(&self, request: &LaunchRequest) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(), // Detached
            "--rm".to_string(),
            "--name".to_string(),
            request.unit_name.clone(),
            "--label".to_string(),
            format!("relay.job-id={}", request.job_id),
        ];

        if let Some(network) = &self.config.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }

        let env = [
            ("RELAY_JOB_ID", request.job_id.to_string()),
            ("RELAY_PROGRAM_ID", request.program_id.clone()),
            ("RELAY_INPUTS", request.inputs.to_string()),
            ("RELAY_ORCHESTRATOR_URL", self.config.orchestrator_url.clone()),
        ];
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push(self.config.image.clone());
        args
    }

    /// Runs podman, failing with the captured output on a non-zero exit
    async fn podman(&self, unit: &str, args: &[String]) -> Result<String, DispatchError> {
        let output = Command::new("podman").args(args).output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            debug!("podman {} stderr: {}", args[0], stderr.trim());
        }

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let reason = format!(
                "podman {} exited with {}: {}",
                args[0],
                exit_code,
                stderr.trim()
            );
            error!("Unit {}: {}", unit, reason);
            return Err(DispatchError::Rejected {
                unit: unit.to_string(),
                reason,
            });
        }

        Ok(stdout.trim().to_string())
    }
}

#[async_trait]
impl Dispatcher for PodmanDispatcher {
    async fn launch(&self, request: &LaunchRequest) -> Result<(), DispatchError> {
        info!(
            "Launching unit {} for job {} with image {}",
            request.unit_name, request.job_id, self.config.image
        );

        let container_id = self
            .podman(&request.unit_name, &self.launch_args(request))
            .await?;

        info!(
            "Unit {} started with container ID: {}",
            request.unit_name, container_id
        );
        Ok(())
    }

    async fn terminate(&self, unit_name: &str) -> Result<(), DispatchError> {
        info!("Terminating unit {}", unit_name);

        // --ignore: a unit that already exited was removed by --rm
        let args = ["rm", "-f", "--ignore", unit_name].map(String::from);
        self.podman(unit_name, &args).await?;

        Ok(())
    }
}
