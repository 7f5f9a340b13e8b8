// Agent lifecycle events relayed through the event-publish port

use serde::Serialize;

use super::types::AgentSnapshot;
use crate::domain::agent::AgentId;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AgentEvent {
    Created { agent: AgentSnapshot },
    Terminated { agent_id: AgentId, name: String },
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Created { .. } => "agent_created",
            AgentEvent::Terminated { .. } => "agent_terminated",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
