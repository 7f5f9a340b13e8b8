// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod sqlite_agent_repository;
pub mod sqlite_message_repository;
pub mod sqlite_task_repository;
pub mod sqlite_workflow_repository;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::domain::repositories::Repositories;

pub use sqlite_agent_repository::SqliteAgentRepository;
pub use sqlite_message_repository::SqliteMessageRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_workflow_repository::SqliteWorkflowRepository;

/// Wires every SQLite adapter onto one pool
pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        agents: Arc::new(SqliteAgentRepository::new(pool.clone())),
        messages: Arc::new(SqliteMessageRepository::new(pool.clone())),
        workflows: Arc::new(SqliteWorkflowRepository::new(pool.clone())),
        tasks: Arc::new(SqliteTaskRepository::new(pool)),
    }
}
