// HTTP handlers
// Each runs the synchronous service facade on tokio's blocking pool

pub mod agents;
pub mod jobs;
pub mod system;
pub mod workflows;

use crate::agents::errors::AgentResult;
use crate::api::errors::ApiError;

/// Runs `f` on the blocking pool and maps its error
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> AgentResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}
