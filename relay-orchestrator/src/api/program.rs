//! Program API Handlers
//!
//! HTTP endpoints for the program registry.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use relay_core::dto::program::{ProgramSummary, UpdateProgram, UploadProgram, UploadProgramResponse};

use crate::api::AppState;
use crate::api::error::ApiResult;

/// POST /api/program
/// Upload a new program
pub async fn upload_program(
    State(state): State<AppState>,
    Json(req): Json<UploadProgram>,
) -> ApiResult<(StatusCode, Json<UploadProgramResponse>)> {
    tracing::info!("Uploading program: {:?}", req.name);

    let program = state.programs.upload(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadProgramResponse { id: program.id }),
    ))
}

/// GET /api/program
/// List all programs
pub async fn list_programs(State(state): State<AppState>) -> ApiResult<Json<Vec<ProgramSummary>>> {
    tracing::debug!("Listing all programs");

    let programs = state.programs.list().await?;

    Ok(Json(programs))
}

/// GET /api/program/{id}/data
/// Raw program data, as fetched by execution units
pub async fn program_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Fetching data of program: {}", id);

    let data = state.programs.get_data(&id).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// POST /api/program/{id}/update
pub async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProgram>,
) -> ApiResult<StatusCode> {
    tracing::info!("Updating program: {}", id);

    state.programs.update(&id, req).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/program/{id}
pub async fn delete_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting program: {}", id);

    state.programs.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
