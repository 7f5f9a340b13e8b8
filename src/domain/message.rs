use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;

pub type MessageId = i64;

/// Sender label for messages written by the core itself
pub const SYSTEM_SENDER: &str = "system";

/// Sender label for messages typed by the human operator
pub const OPERATOR_SENDER: &str = "operator";

/// One entry of an agent's append-only message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub agent_id: AgentId,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub meta: serde_json::Value,
}

/// Data required to append a message; the timestamp is assigned at write time
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub agent_id: AgentId,
    pub sender: String,
    pub content: String,
    pub meta: serde_json::Value,
}

impl NewMessage {
    pub fn new(
        agent_id: AgentId,
        sender: impl Into<String>,
        content: impl Into<String>,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            agent_id,
            sender: sender.into(),
            content: content.into(),
            meta,
        }
    }
}
