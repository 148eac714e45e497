//! Job API Handlers
//!
//! HTTP endpoints for job lifecycle management.
//!
//! The status endpoint accepts reports from anyone who knows the job id;
//! there is no check that the caller is the job's execution unit.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use relay_core::domain::job::{CancelOutcome, Job};
use relay_core::dto::job::{
    JobStatusResponse, ReportStatusRequest, ReportStatusResponse, SubmitJobResponse,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// POST /api/program/{id}/job
/// Submit a job running the program with the given JSON inputs
pub async fn submit_job(
    State(state): State<AppState>,
    Path(program_id): Path<String>,
    Json(inputs): Json<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    tracing::info!("Submitting job for program: {}", program_id);

    let job = state.jobs.submit(&program_id, inputs).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitJobResponse {
            job_id: job.id,
            execution_unit_name: job.execution_unit_name,
        }),
    ))
}

/// GET /api/job/{id}
/// Get job details by ID
pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = state.jobs.get_job(id).await?;

    Ok(Json(job))
}

/// GET /api/job/{id}/status
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    tracing::debug!("Getting status of job: {}", id);

    let status = state.jobs.get_status(id).await?;

    Ok(Json(JobStatusResponse { status }))
}

/// POST /api/job/{id}/status
/// Status report from an execution unit
pub async fn report_job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReportStatusRequest>,
) -> ApiResult<Json<ReportStatusResponse>> {
    tracing::debug!("Status report for job {}: {}", id, req.status);

    let change = state.jobs.report_status(id, req.status).await?;

    Ok(Json(ReportStatusResponse { change }))
}

/// POST /api/job/{id}/cancel
/// Cancel a job; finished jobs answer with `already_terminal`
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelOutcome>> {
    tracing::info!("Cancelling job: {}", id);

    let outcome = state.jobs.cancel(id).await?;

    Ok(Json(outcome))
}
