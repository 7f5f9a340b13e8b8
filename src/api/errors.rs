use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::agents::errors::AgentError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 503 Service Unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        let message = err.to_string();
        match err {
            AgentError::NotInitialized => {
                Self::service_unavailable(format!("{} (POST /api/init)", message))
            }
            AgentError::AgentNotFound(_)
            | AgentError::WorkflowNotFound(_)
            | AgentError::TaskNotFound(_) => Self::not_found(message),
            AgentError::InvalidStateTransition { .. } => Self::conflict(message),
            AgentError::Validation(_) | AgentError::JsonError(_) => Self::bad_request(message),
            _ => {
                tracing::error!(error = %message, "Request failed");
                Self::internal_server_error(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_is_service_unavailable() {
        let err = ApiError::from(AgentError::NotInitialized);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.message.contains("/api/init"));
    }

    #[test]
    fn lookups_map_to_not_found() {
        assert_eq!(
            ApiError::from(AgentError::WorkflowNotFound(3)).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AgentError::AgentNotFound("9".to_string())).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn transition_maps_to_conflict() {
        let err = ApiError::from(AgentError::InvalidStateTransition {
            from: "completed".to_string(),
            to: "in_progress".to_string(),
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
