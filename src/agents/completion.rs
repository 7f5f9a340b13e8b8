use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::AgentResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of the conversation context sent to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Remote completion capability: turns a conversation into the next reply
///
/// Failures are reported as `AgentError::LlmError`. Timeouts are the
/// implementation's concern.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, context: &[ChatMessage]) -> AgentResult<String>;
}
