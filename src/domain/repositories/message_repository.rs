use async_trait::async_trait;

use super::RepoResult;
use crate::domain::agent::AgentId;
use crate::domain::message::{Message, NewMessage};

/// Append-only message log
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: NewMessage) -> RepoResult<Message>;

    /// The most recent `limit` messages for one agent, oldest first
    async fn recent_for_agent(&self, agent_id: AgentId, limit: u32) -> RepoResult<Vec<Message>>;

    async fn count_for_agent(&self, agent_id: AgentId) -> RepoResult<u64>;
}
