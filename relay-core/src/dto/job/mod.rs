//! Job DTOs for the orchestrator HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{JobStatus, StatusChange};

/// Response to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    pub execution_unit_name: String,
}

/// Current status of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
}

/// Status report sent by an execution unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusRequest {
    pub status: JobStatus,
}

/// Acknowledgement of a status report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusResponse {
    pub change: StatusChange,
}
