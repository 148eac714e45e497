//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::repository::StoreError;
use crate::service::job::JobError;
use crate::service::message::MessageError;
use crate::service::program::ProgramError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// The cluster scheduler rejected a request. Carries the affected job so a
    /// caller can still inspect its record.
    DispatchFailure { job_id: Uuid, message: String },
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::DispatchFailure { job_id, message } => {
                tracing::error!("Dispatch error for job {}: {}", job_id, message);
                (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({ "error": message, "job_id": job_id }),
                )
            }
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreError(err)
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(_) | JobError::ProgramNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            JobError::InvalidTransition { .. } | JobError::Conflict(_) => {
                ApiError::Conflict(err.to_string())
            }
            JobError::DispatchFailure { job_id, .. } => ApiError::DispatchFailure {
                job_id,
                message: err.to_string(),
            },
            JobError::Store(err) => ApiError::StoreError(err),
        }
    }
}

impl From<MessageError> for ApiError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::ValidationError(msg) => ApiError::BadRequest(msg),
            MessageError::Store(err) => ApiError::StoreError(err),
        }
    }
}

impl From<ProgramError> for ApiError {
    fn from(err: ProgramError) -> Self {
        match err {
            ProgramError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ProgramError::ValidationError(msg) => ApiError::BadRequest(msg),
            ProgramError::Store(err) => ApiError::StoreError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
