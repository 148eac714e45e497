//! In-memory dispatcher
//!
//! Records launches and terminations instead of talking to a cluster. Selected
//! with `RELAY_DISPATCHER=memory` to run the orchestrator without podman, where
//! execution units are simulated by calling the API by hand. Tests use it to
//! observe dispatcher calls and to inject scheduler failures.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use super::{DispatchError, Dispatcher, LaunchRequest};

#[derive(Debug, Default)]
pub struct InMemoryDispatcher {
    launched: Mutex<Vec<LaunchRequest>>,
    terminated: Mutex<Vec<String>>,
    reject_launch: AtomicBool,
    reject_terminate: AtomicBool,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent launches fail
    pub fn reject_launches(&self, reject: bool) {
        self.reject_launch.store(reject, Ordering::SeqCst);
    }

    /// Makes subsequent terminations fail
    pub fn reject_terminations(&self, reject: bool) {
        self.reject_terminate.store(reject, Ordering::SeqCst);
    }

    /// Launch requests accepted so far, oldest first
    pub fn launched(&self) -> Vec<LaunchRequest> {
        self.launched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Unit names terminated so far, oldest first
    pub fn terminated(&self) -> Vec<String> {
        self.terminated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Dispatcher for InMemoryDispatcher {
    async fn launch(&self, request: &LaunchRequest) -> Result<(), DispatchError> {
        if self.reject_launch.load(Ordering::SeqCst) {
            return Err(DispatchError::Rejected {
                unit: request.unit_name.clone(),
                reason: "launch rejected".to_string(),
            });
        }

        info!(
            "Recorded launch of unit {} for job {}",
            request.unit_name, request.job_id
        );
        self.launched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        Ok(())
    }

    async fn terminate(&self, unit_name: &str) -> Result<(), DispatchError> {
        if self.reject_terminate.load(Ordering::SeqCst) {
            return Err(DispatchError::Rejected {
                unit: unit_name.to_string(),
                reason: "termination rejected".to_string(),
            });
        }

        info!("Recorded termination of unit {}", unit_name);
        self.terminated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(unit_name.to_string());
        Ok(())
    }
}
