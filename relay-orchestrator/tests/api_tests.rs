use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, SecondsFormat, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use relay_core::domain::job::Job;
use relay_core::domain::message::Message;
use relay_core::domain::program::Program;
use relay_core::dto::message::MessagesResponse;
use relay_orchestrator::api::{AppState, create_router};
use relay_orchestrator::dispatcher::InMemoryDispatcher;
use relay_orchestrator::repository::{
    JobRepository, MemoryStore, MessageRepository, ProgramChanges, ProgramRepository, StoreError,
    StoreResult,
};

/// Router backed by the in-memory store, plus the dispatcher it calls
fn create_test_app() -> (Router, Arc<InMemoryDispatcher>) {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Arc::new(InMemoryDispatcher::new());
    let state = AppState::new(store.clone(), store.clone(), store, dispatcher.clone());
    (create_router(state), dispatcher)
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, Body::from(body.to_string())).await;
    (status, parse(&bytes))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = send(app, "GET", uri, Body::empty()).await;
    (status, parse(&bytes))
}

fn parse(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap()
    }
}

async fn upload_program(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/program",
        json!({ "name": "sampler", "metadata": { "shots": 100 }, "data": "run()" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn submit_job(app: &Router, program_id: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        &format!("/api/program/{}/job", program_id),
        json!({ "circuit": "bell" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["job_id"].as_str().unwrap().to_string()
}

async fn report(app: &Router, job_id: &str, status: &str) -> (StatusCode, Value) {
    send_json(
        app,
        "POST",
        &format!("/api/job/{}/status", job_id),
        json!({ "status": status }),
    )
    .await
}

async fn post_message(app: &Router, job_id: &str, payload: &str) -> DateTime<Utc> {
    let (status, bytes) = send(
        app,
        "POST",
        &format!("/api/job/{}/message", job_id),
        Body::from(payload.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(parse(&bytes)["timestamp"].clone()).unwrap()
}

async fn results(app: &Router, uri: &str) -> MessagesResponse {
    let (status, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

fn payloads(response: &MessagesResponse) -> Vec<String> {
    response
        .messages
        .iter()
        .map(|m| String::from_utf8(m.payload.clone()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app();

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "relay-orchestrator");
}

#[tokio::test]
async fn test_submit_then_incremental_results() {
    let (app, dispatcher) = create_test_app();
    let program_id = upload_program(&app).await;
    let job_id = submit_job(&app, &program_id).await;

    let (_, body) = get(&app, &format!("/api/job/{}/status", job_id)).await;
    assert_eq!(body["status"], "Creating");

    let launched = dispatcher.launched();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].job_id.to_string(), job_id);
    assert_eq!(launched[0].inputs, json!({ "circuit": "bell" }));

    let (status, body) = report(&app, &job_id, "Running").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["change"], "updated");

    post_message(&app, &job_id, "partial-result-1").await;
    let all = results(&app, &format!("/api/job/{}/results", job_id)).await;
    assert_eq!(payloads(&all), vec!["partial-result-1"]);
    let t1 = all.last_timestamp().unwrap();

    post_message(&app, &job_id, "partial-result-2").await;
    let since = t1.to_rfc3339_opts(SecondsFormat::Micros, true);
    let newer = results(&app, &format!("/api/job/{}/results/{}", job_id, since)).await;
    assert_eq!(payloads(&newer), vec!["partial-result-2"]);

    let (status, _) = report(&app, &job_id, "Completed").await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&app, &format!("/api/job/{}/status", job_id)).await;
    assert_eq!(body["status"], "Completed");
}

#[tokio::test]
async fn test_cancel_then_late_completion_is_rejected() {
    let (app, dispatcher) = create_test_app();
    let program_id = upload_program(&app).await;
    let job_id = submit_job(&app, &program_id).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/job/{}/cancel", job_id),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "canceled");
    assert_eq!(dispatcher.terminated().len(), 1);

    let (status, _) = report(&app, &job_id, "Completed").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = get(&app, &format!("/api/job/{}/status", job_id)).await;
    assert_eq!(body["status"], "Canceled");
}

#[tokio::test]
async fn test_cancel_finished_job_reports_terminal_status() {
    let (app, dispatcher) = create_test_app();
    let program_id = upload_program(&app).await;
    let job_id = submit_job(&app, &program_id).await;
    report(&app, &job_id, "Failed").await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/job/{}/cancel", job_id),
        Value::Null,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "outcome": "already_terminal", "status": "Failed" })
    );
    assert!(dispatcher.terminated().is_empty());
}

#[tokio::test]
async fn test_repeated_status_report_is_unchanged() {
    let (app, _) = create_test_app();
    let program_id = upload_program(&app).await;
    let job_id = submit_job(&app, &program_id).await;

    report(&app, &job_id, "Running").await;
    let (status, body) = report(&app, &job_id, "Running").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["change"], "unchanged");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (app, _) = create_test_app();
    let id = Uuid::new_v4();

    let (status, body) = get(&app, &format!("/api/job/{}/status", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));

    let (status, _) = get(&app, &format!("/api/job/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = report(&app, &id.to_string(), "Running").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, "POST", &format!("/api/job/{}/cancel", id), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_for_unknown_program_is_not_found() {
    let (app, dispatcher) = create_test_app();

    let (status, _) = send_json(&app, "POST", "/api/program/missing/job", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(dispatcher.launched().is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_keeps_failed_job() {
    let (app, dispatcher) = create_test_app();
    let program_id = upload_program(&app).await;
    dispatcher.reject_launches(true);

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/program/{}/job", program_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let job_id = body["job_id"].as_str().unwrap();
    let (status, body) = get(&app, &format!("/api/job/{}/status", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Failed");
}

#[tokio::test]
async fn test_messages_for_unknown_job() {
    let (app, _) = create_test_app();
    let job_id = Uuid::new_v4().to_string();

    let empty = results(&app, &format!("/api/job/{}/results", job_id)).await;
    assert!(empty.messages.is_empty());

    post_message(&app, &job_id, "early").await;
    let all = results(&app, &format!("/api/job/{}/results", job_id)).await;
    assert_eq!(payloads(&all), vec!["early"]);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/job/{}/messages", job_id),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["deleted"], 1);

    let after = results(&app, &format!("/api/job/{}/results", job_id)).await;
    assert!(after.messages.is_empty());
}

#[tokio::test]
async fn test_results_since_rejects_bad_timestamp() {
    let (app, _) = create_test_app();

    let (status, body) = get(
        &app,
        &format!("/api/job/{}/results/not-a-time", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_program_registry_endpoints() {
    let (app, _) = create_test_app();
    let program_id = upload_program(&app).await;

    let (status, body) = get(&app, "/api/program").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], program_id.as_str());
    assert_eq!(body[0]["name"], "sampler");
    assert_eq!(body[0]["status"], "Active");
    assert!(body[0].get("data").is_none());

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/program/{}/update", program_id),
        json!({ "data": "run(2)" }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, data) = send(
        &app,
        "GET",
        &format!("/api/program/{}/data", program_id),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data, b"run(2)");

    let uri = format!("/api/program/{}", program_id);
    let (status, _) = send(&app, "DELETE", &uri, Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &uri, Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejects_empty_program() {
    let (app, _) = create_test_app();

    let (status, _) = send_json(&app, "POST", "/api/program", json!({ "data": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Store failures
// =============================================================================

/// Store whose every call fails
struct BrokenStore;

fn broken<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl JobRepository for BrokenStore {
    async fn insert(&self, _job: &Job) -> StoreResult<()> {
        broken()
    }

    async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<Job>> {
        broken()
    }

    async fn compare_and_swap_status(
        &self,
        _id: Uuid,
        _expected: relay_core::domain::job::JobStatus,
        _new: relay_core::domain::job::JobStatus,
    ) -> StoreResult<bool> {
        broken()
    }
}

#[async_trait]
impl MessageRepository for BrokenStore {
    async fn append(&self, _job_id: Uuid, _payload: Vec<u8>) -> StoreResult<Message> {
        broken()
    }

    async fn find_by_job(
        &self,
        _job_id: Uuid,
        _since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<Message>> {
        broken()
    }

    async fn delete_by_job(&self, _job_id: Uuid) -> StoreResult<u64> {
        broken()
    }
}

#[async_trait]
impl ProgramRepository for BrokenStore {
    async fn insert(&self, _program: &Program) -> StoreResult<()> {
        broken()
    }

    async fn find_by_id(&self, _id: &str) -> StoreResult<Option<Program>> {
        broken()
    }

    async fn exists(&self, _id: &str) -> StoreResult<bool> {
        broken()
    }

    async fn list_all(&self) -> StoreResult<Vec<Program>> {
        broken()
    }

    async fn update(&self, _id: &str, _changes: &ProgramChanges) -> StoreResult<bool> {
        broken()
    }

    async fn delete(&self, _id: &str) -> StoreResult<bool> {
        broken()
    }
}

#[tokio::test]
async fn test_store_failures_are_server_errors() {
    let store = Arc::new(BrokenStore);
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(InMemoryDispatcher::new()),
    );
    let app = create_router(state);
    let job_id = Uuid::new_v4();

    for uri in [
        format!("/api/job/{}/status", job_id),
        format!("/api/job/{}/results", job_id),
        "/api/program".to_string(),
    ] {
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["error"], "Internal server error");
    }
}
