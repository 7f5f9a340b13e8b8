use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::blocking;
use crate::agents::errors::AgentError;
use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::workflow::{Workflow, WorkflowId};
use crate::execution::job_queue::JobOperation;
use crate::services::workflow_orchestrator::{StartedWorkflow, WorkflowStatusView};

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub initial_task: String,
}

#[derive(Debug, Deserialize)]
pub struct StartWorkflowRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    pub task: String,
}

/// GET /api/workflows
pub async fn list_workflows(State(ctx): State<AppState>) -> Result<Json<Vec<Workflow>>, ApiError> {
    let workflows = blocking(move || ctx.workflows.list_workflows()).await?;
    Ok(Json(workflows))
}

/// POST /api/workflows
pub async fn create_workflow(
    State(ctx): State<AppState>,
    Json(req): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Workflow name required"));
    }

    let workflow = blocking(move || {
        ctx.workflows
            .create_workflow(&req.name, req.description.as_deref(), &req.initial_task)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(workflow)))
}

/// Workflow with its tasks and in-memory step context
///
/// GET /api/workflows/:id
pub async fn workflow_status(
    State(ctx): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> Result<Json<WorkflowStatusView>, ApiError> {
    let view = blocking(move || ctx.workflows.workflow_status(id)).await?;
    Ok(Json(view))
}

/// POST /api/workflows/:id/start
pub async fn start_workflow(
    State(ctx): State<AppState>,
    Path(id): Path<WorkflowId>,
    Json(req): Json<StartWorkflowRequest>,
) -> Result<Json<StartedWorkflow>, ApiError> {
    let started = blocking(move || ctx.workflows.start_workflow(id, &req.message)).await?;
    Ok(Json(started))
}

/// Queue the three-stage pipeline; poll the returned job id
///
/// POST /api/workflows/pipeline
pub async fn run_pipeline(
    State(ctx): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.task.trim().is_empty() {
        return Err(ApiError::bad_request("Task description required"));
    }
    if !ctx.registry.is_initialized() {
        return Err(AgentError::NotInitialized.into());
    }

    let orchestrator = ctx.workflows.clone();
    let operation = JobOperation::blocking(move || {
        let summary = orchestrator
            .execute_complete_pipeline(&req.task)
            .map_err(|e| e.to_string())?;
        serde_json::to_value(summary).map_err(|e| e.to_string())
    });
    let job_id = ctx.jobs.submit_new(operation)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": job_id, "status": "pending" })),
    ))
}
