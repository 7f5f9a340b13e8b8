use std::collections::BTreeMap;

use axum::{extract::State, Json};

use super::blocking;
use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::services::agent_service::Overview;

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Create or adopt the core agents
///
/// POST /api/init
pub async fn initialize(
    State(ctx): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let status = blocking(move || ctx.agents.initialize_core_agents()).await?;
    Ok(Json(status))
}

/// Agent and workflow counts
///
/// GET /api/stats/overview
pub async fn overview(State(ctx): State<AppState>) -> Result<Json<Overview>, ApiError> {
    let overview = blocking(move || ctx.agents.overview()).await?;
    Ok(Json(overview))
}
