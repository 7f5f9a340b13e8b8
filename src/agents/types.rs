use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, AgentKind, AgentStatus};

/// Static identity of an agent: what it is and how it is prompted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub role: String,
    pub kind: AgentKind,
    pub description: String,
    pub system_prompt: String,
    pub model: String,
}

/// Outcome of one `send_message` call
///
/// Completion failures do not raise; they come back as `Failed` so callers
/// can show them in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AgentReply {
    Completed { text: String },
    Failed { reason: String },
}

impl AgentReply {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentReply::Completed { .. })
    }

    /// Display text; failures render as `Error processing message: <reason>`
    pub fn text(&self) -> String {
        match self {
            AgentReply::Completed { text } => text.clone(),
            AgentReply::Failed { reason } => format!("Error processing message: {}", reason),
        }
    }

    pub fn into_result(self) -> Result<String, String> {
        match self {
            AgentReply::Completed { text } => Ok(text),
            AgentReply::Failed { reason } => Err(reason),
        }
    }
}

/// Point-in-time description of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: Option<AgentId>,
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub status: AgentStatus,
    pub description: String,
}

/// Capability specification designed by the factory agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub capabilities: Vec<String>,
    pub system_prompt: String,
    pub description: String,
    pub model: String,
    pub tools: Vec<String>,
    #[serde(default)]
    pub requirements: serde_json::Map<String, serde_json::Value>,
}

impl AgentSpec {
    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            name: self.name.clone(),
            role: self.role.clone(),
            kind: self.kind,
            description: self.description.clone(),
            system_prompt: self.system_prompt.clone(),
            model: self.model.clone(),
        }
    }
}

/// Ledger entry for an agent the factory created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedAgentSummary {
    pub id: Option<AgentId>,
    pub name: String,
    pub role: String,
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reply_renders_error_text() {
        let reply = AgentReply::Failed {
            reason: "timeout".to_string(),
        };
        assert!(!reply.is_success());
        assert_eq!(reply.text(), "Error processing message: timeout");
    }

    #[test]
    fn reply_serializes_tagged() {
        let reply = AgentReply::Completed {
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["text"], "hi");
    }
}
