use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::blocking;
use crate::agents::researcher::ResearchReport;
use crate::agents::types::AgentSnapshot;
use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::agent::AgentId;
use crate::domain::message::Message;
use crate::services::agent_service::{AgentListing, CreateAgentResult, SendResult};

const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub role: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
}

/// GET /api/agents
pub async fn list_agents(State(ctx): State<AppState>) -> Result<Json<Vec<AgentListing>>, ApiError> {
    let agents = blocking(move || ctx.agents.list_agents()).await?;
    Ok(Json(agents))
}

/// GET /api/agents/:id
pub async fn get_agent(
    State(ctx): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<AgentSnapshot>, ApiError> {
    blocking(move || ctx.agents.agent_status(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Agent not found: {}", id)))
}

/// Create a dynamic agent through the factory
///
/// POST /api/agents
pub async fn create_agent(
    State(ctx): State<AppState>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<CreateAgentResult>), ApiError> {
    if req.role.trim().is_empty() {
        return Err(ApiError::bad_request("Agent role required"));
    }

    let result = blocking(move || {
        ctx.agents
            .create_dynamic_agent(&req.role, &req.capabilities, &req.reason)
    })
    .await?;

    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(result)))
}

/// DELETE /api/agents/:id
pub async fn terminate_agent(
    State(ctx): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<Value>, ApiError> {
    let terminated = blocking(move || ctx.agents.terminate_agent(id)).await?;
    Ok(Json(json!({ "agent_id": id, "terminated": terminated })))
}

/// GET /api/agents/:id/messages?limit=
pub async fn conversation_history(
    State(ctx): State<AppState>,
    Path(id): Path<AgentId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let messages = blocking(move || ctx.agents.conversation_history(id, limit)).await?;
    Ok(Json(messages))
}

/// Send operator text to an agent
///
/// POST /api/agents/:id/message
pub async fn send_message(
    State(ctx): State<AppState>,
    Path(id): Path<AgentId>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendResult>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message content required"));
    }

    let result = blocking(move || ctx.agents.send_message_to_agent(id, &req.message)).await?;
    Ok(Json(result))
}

/// POST /api/research
pub async fn research(
    State(ctx): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchReport>, ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::bad_request("Research topic required"));
    }

    let report = blocking(move || ctx.agents.research_topic(&req.topic)).await?;
    Ok(Json(report))
}
