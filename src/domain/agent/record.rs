use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{AgentId, AgentKind, AgentStatus};

/// Persisted mirror of an agent
///
/// The in-memory `Agent` owns conversation state; this record is what
/// survives a restart and what listings fall back to before the registry
/// has been initialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub role: String,
    pub status: AgentStatus,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a new agent record
#[derive(Debug, Clone)]
pub struct NewAgentRecord {
    pub name: String,
    pub kind: AgentKind,
    pub role: String,
    pub status: AgentStatus,
    pub config: serde_json::Value,
}
