//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod message;
pub mod program;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::repository::{JobRepository, MessageRepository, ProgramRepository};
use crate::service::{JobService, MessageService, ProgramService};

/// Shared handler state
///
/// Holds only service handles; all job state lives in the repositories, so
/// any number of orchestrator instances can serve the same store.
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobService,
    pub messages: MessageService,
    pub programs: ProgramService,
}

impl AppState {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        messages: Arc<dyn MessageRepository>,
        programs: Arc<dyn ProgramRepository>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            jobs: JobService::new(jobs, programs.clone(), dispatcher),
            messages: MessageService::new(messages),
            programs: ProgramService::new(programs),
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Program endpoints
        .route(
            "/program",
            post(program::upload_program).get(program::list_programs),
        )
        .route("/program/{id}", delete(program::delete_program))
        .route("/program/{id}/data", get(program::program_data))
        .route("/program/{id}/update", post(program::update_program))
        .route("/program/{id}/job", post(job::submit_job))
        // Job endpoints
        .route("/job/{id}", get(job::get_job))
        .route(
            "/job/{id}/status",
            get(job::get_job_status).post(job::report_job_status),
        )
        .route("/job/{id}/cancel", post(job::cancel_job))
        // Message endpoints
        .route("/job/{id}/message", post(message::add_message))
        .route("/job/{id}/messages", delete(message::delete_messages))
        .route("/job/{id}/results", get(message::get_job_results))
        .route(
            "/job/{id}/results/{timestamp}",
            get(message::get_new_job_results),
        );

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api", api)
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
