//! End-to-end API integration tests
//!
//! These tests drive the HTTP router with `oneshot` against an isolated
//! context:
//! - Health and initialization
//! - Error mapping for uninitialized agents, unknown ids and bad transitions
//! - Workflow creation, start and the queued pipeline

mod common;

use std::sync::Arc;
use std::time::Duration;

use agent_orchestra::api;
use agent_orchestra::context::AppContext;
use agent_orchestra::infrastructure::llm::ScriptedCompletionClient;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application over a fresh context
async fn setup_app() -> (Router, Arc<AppContext>) {
    let ctx = tokio::task::spawn_blocking(|| {
        let (ctx, _) = common::build_context(ScriptedCompletionClient::new());
        ctx.jobs.start().expect("start job queue");
        Arc::new(ctx)
    })
    .await
    .expect("Failed to build context");

    (api::router(ctx.clone()), ctx)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_check() {
    let (app, _ctx) = setup_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_agents_require_initialization() {
    let (app, _ctx) = setup_app().await;

    let (status, body) = send(&app, "GET", "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(
        &app,
        "POST",
        "/api/agents/1/message",
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("initialize"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_init_then_message_agent() {
    let (app, ctx) = setup_app().await;

    let (status, body) = send(&app, "POST", "/api/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orchestrator"], "initialized");

    let (_, agents) = send(&app, "GET", "/api/agents", None).await;
    assert_eq!(agents.as_array().unwrap().len(), 3);

    let driver_id = ctx
        .registry
        .resolve_by_name("Driver")
        .and_then(|a| a.id())
        .unwrap();
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/agents/{}/message", driver_id),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["agent_name"], "Driver");
    assert_eq!(body["status"], "idle");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/agents/{}/messages?limit=1", driver_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/agents/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_and_terminate_agent() {
    let (app, _ctx) = setup_app().await;
    send(&app, "POST", "/api/init", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/agents",
        Some(json!({ "role": "Tester", "capabilities": ["coding"], "reason": "QA" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["agent"]["type"], "dynamic");
    let id = body["agent"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/api/agents/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["terminated"], true);

    let (status, _) = send(&app, "GET", &format!("/api/agents/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_workflow_lifecycle() {
    let (app, _ctx) = setup_app().await;
    send(&app, "POST", "/api/init", None).await;

    let (status, workflow) = send(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({ "name": "Demo", "description": "desc", "initial_task": "build X" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(workflow["status"], "pending");
    let id = workflow["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/workflows/{}/start", id),
        Some(json!({ "message": "go" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in_progress");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/workflows/{}/start", id),
        Some(json!({ "message": "go" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, view) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(view["tasks"][0]["status"], "completed");

    let (status, _) = send(&app, "GET", "/api/workflows/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pipeline_is_queued_and_polled() {
    let (app, _ctx) = setup_app().await;
    send(&app, "POST", "/api/init", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/workflows/pipeline",
        Some(json!({ "task": "Build a REST API" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let mut job = Value::Null;
    for _ in 0..100 {
        let (_, body) = send(&app, "GET", &format!("/api/jobs/{}", job_id), None).await;
        if body["status"] != "pending" {
            job = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(job["status"], "completed");
    assert_eq!(job["result"]["status"], "completed");

    let (_, overview) = send(&app, "GET", "/api/stats/overview", None).await;
    assert_eq!(overview["workflows_by_status"]["completed"], 1);

    let (status, _) = send(&app, "GET", "/api/jobs/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
