use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::repositories::RepositoryError;
use crate::execution::bridge::BridgeError;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agents not initialized. Call initialize first.")]
    NotInitialized,

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Workflow {0} not found")]
    WorkflowNotFound(i64),

    #[error("Task {0} not found")]
    TaskNotFound(i64),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Agent call failed: {0}")]
    AgentCallFailed(String),

    #[error("LLM API error: {0}")]
    LlmError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Job queue is not running")]
    QueueNotRunning,

    #[error("Execution bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<DomainError> for AgentError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { from, to, .. } => {
                AgentError::InvalidStateTransition { from, to }
            }
            DomainError::Validation(msg) => AgentError::Validation(msg),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
