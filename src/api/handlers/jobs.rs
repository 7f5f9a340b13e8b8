use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::AppState;
use crate::execution::job_queue::JobStatus;

/// Status of a background job
///
/// GET /api/jobs/:id
pub async fn job_status(
    State(ctx): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<JobStatus>) {
    let status = ctx.jobs.status(&id);
    let code = match status {
        JobStatus::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    (code, Json(status))
}
