//! Cluster dispatcher
//!
//! The orchestrator never runs programs itself. It asks a dispatcher to launch
//! a named execution unit and, on cancellation, to terminate it. Both calls are
//! fire-and-forget: success only means the scheduler accepted the request.
//!
//! The orchestrator does not watch unit health. A unit that dies without
//! reporting leaves its job `Running` until someone cancels it.

pub mod memory;
pub mod podman;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::InMemoryDispatcher;
pub use podman::{PodmanConfig, PodmanDispatcher};

/// Everything an execution unit needs to run one job
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub unit_name: String,
    pub program_id: String,
    pub job_id: Uuid,
    pub inputs: serde_json::Value,
}

/// The scheduler rejected a launch or termination
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to invoke scheduler: {0}")]
    Io(#[from] std::io::Error),

    #[error("scheduler rejected request for unit {unit}: {reason}")]
    Rejected { unit: String, reason: String },
}

/// Capability to start and stop execution units on a cluster
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Launches the unit described by `request`
    async fn launch(&self, request: &LaunchRequest) -> Result<(), DispatchError>;

    /// Requests termination of a unit. Terminating a unit that already exited
    /// is not an error.
    async fn terminate(&self, unit_name: &str) -> Result<(), DispatchError>;
}
