// Repository ports (persistence contracts)
// Implemented by adapters in the infrastructure layer

pub mod agent_repository;
pub mod message_repository;
pub mod task_repository;
pub mod workflow_repository;

use std::sync::Arc;

use thiserror::Error;

pub use agent_repository::AgentRepository;
pub use message_repository::MessageRepository;
pub use task_repository::TaskRepository;
pub use workflow_repository::WorkflowRepository;

/// Errors returned by every repository port
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// The full set of persistence ports, cloned into every component that needs storage
#[derive(Clone)]
pub struct Repositories {
    pub agents: Arc<dyn AgentRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}
