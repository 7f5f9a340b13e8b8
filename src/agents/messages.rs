// Metadata attached to every entry of an agent's message log

use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageMeta {
    Incoming,
    Outgoing,
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool: Option<String>,
    },
    AgentCreated { agent_name: String, agent_id: Option<AgentId> },
    AgentTerminated { agent_name: String },
    AgentRequest { role: String },
    Delegation { target: String },
    Workflow { workflow_id: i64, task_id: i64 },
    System,
}

impl MessageMeta {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_is_tagged_by_type() {
        let value = MessageMeta::Error {
            error: "boom".to_string(),
            tool: None,
        }
        .to_value();

        assert_eq!(value["type"], "error");
        assert_eq!(value["error"], "boom");
        assert!(value.get("tool").is_none());
        assert_eq!(MessageMeta::Incoming.to_value()["type"], "incoming");
    }
}
