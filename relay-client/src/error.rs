//! Error types for the Relay client

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Relay client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The orchestrator recorded the job but the cluster refused to start it
    #[error("Job {job_id} could not be dispatched: {message}")]
    DispatchFailed { job_id: Uuid, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a failed response body
    ///
    /// The orchestrator answers with `{"error": "..."}`; dispatch failures
    /// also carry the `job_id` of the job left in `Failed`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::api_error(status, body);
        };

        let message = json
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or(body)
            .to_string();

        let job_id = json
            .get("job_id")
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok());

        match job_id {
            Some(job_id) if status == 502 => Self::DispatchFailed { job_id, message },
            _ => Self::api_error(status, message),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the request conflicted with the job's current state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ApiError { status: 409, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
            || matches!(self, Self::DispatchFailed { .. })
    }
}
