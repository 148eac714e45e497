//! Message API Handlers
//!
//! HTTP endpoints for the per-job result stream. Execution units post raw
//! payload bytes; polling callers read them back either in full or only those
//! newer than the last timestamp they saw.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use relay_core::dto::message::{
    AppendMessageResponse, DeleteMessagesResponse, MessageEntry, MessagesResponse,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/job/{id}/message
/// Append the request body as a message
pub async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AppendMessageResponse>)> {
    tracing::debug!("Adding {} byte message for job: {}", body.len(), id);

    let message = state.messages.append(id, body.to_vec()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AppendMessageResponse {
            timestamp: message.timestamp,
        }),
    ))
}

/// GET /api/job/{id}/results
/// All messages of a job, oldest first
pub async fn get_job_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessagesResponse>> {
    tracing::debug!("Getting results for job: {}", id);

    let messages = state.messages.fetch_all(id).await?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(MessageEntry::from).collect(),
    }))
}

/// GET /api/job/{id}/results/{timestamp}
/// Messages strictly newer than an RFC 3339 timestamp
pub async fn get_new_job_results(
    State(state): State<AppState>,
    Path((id, timestamp)): Path<(Uuid, String)>,
) -> ApiResult<Json<MessagesResponse>> {
    tracing::debug!("Getting results for job {} since {}", id, timestamp);

    let since = parse_timestamp(&timestamp)?;
    let messages = state.messages.fetch_since(id, since).await?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(MessageEntry::from).collect(),
    }))
}

/// DELETE /api/job/{id}/messages
pub async fn delete_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteMessagesResponse>> {
    let deleted = state.messages.delete_all(id).await?;

    Ok(Json(DeleteMessagesResponse { deleted }))
}

fn parse_timestamp(raw: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("Invalid timestamp '{}': {}", raw, e)))
}
