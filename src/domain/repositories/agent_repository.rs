use async_trait::async_trait;

use super::RepoResult;
use crate::domain::agent::{AgentId, AgentKind, AgentRecord, AgentStatus, NewAgentRecord};

/// Repository trait for persisted agent records
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert a new record and return it with its assigned id
    async fn create(&self, agent: NewAgentRecord) -> RepoResult<AgentRecord>;

    async fn find_by_id(&self, id: AgentId) -> RepoResult<Option<AgentRecord>>;

    /// Used to adopt the identity of a core agent that survived a restart
    async fn find_by_name_and_kind(
        &self,
        name: &str,
        kind: AgentKind,
    ) -> RepoResult<Option<AgentRecord>>;

    /// All records ordered by id
    async fn list(&self) -> RepoResult<Vec<AgentRecord>>;

    /// Fails with `NotFound` if no record has this id
    async fn update_status(&self, id: AgentId, status: AgentStatus) -> RepoResult<()>;
}
