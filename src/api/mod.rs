// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use handlers::{agents, jobs, system, workflows};

/// Shared handler state
pub type AppState = Arc<AppContext>;

/// Builds the HTTP router over `state`
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(system::health_check))
        .route("/api/init", post(system::initialize))
        .route("/api/stats/overview", get(system::overview))
        // Agent routes
        .route("/api/agents", get(agents::list_agents).post(agents::create_agent))
        .route(
            "/api/agents/:id",
            get(agents::get_agent).delete(agents::terminate_agent),
        )
        .route("/api/agents/:id/messages", get(agents::conversation_history))
        .route("/api/agents/:id/message", post(agents::send_message))
        .route("/api/research", post(agents::research))
        // Workflow routes
        .route(
            "/api/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route("/api/workflows/pipeline", post(workflows::run_pipeline))
        .route("/api/workflows/:id", get(workflows::workflow_status))
        .route("/api/workflows/:id/start", post(workflows::start_workflow))
        // Jobs
        .route("/api/jobs/:id", get(jobs::job_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
