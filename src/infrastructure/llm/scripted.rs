use std::sync::Mutex;

use async_trait::async_trait;

use crate::agents::completion::{ChatMessage, ChatRole, CompletionClient};
use crate::agents::errors::{AgentError, AgentResult};

enum Rule {
    Reply { needle: String, reply: String },
    Fail { needle: String, error: String },
}

/// A recorded call to the scripted client
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
}

/// Offline completion client driven by substring rules
///
/// Rules are matched against the latest user turn in registration order.
/// Without a matching rule the reply echoes the prompt, so the system stays
/// usable without network access.
#[derive(Default)]
pub struct ScriptedCompletionClient {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever the prompt contains `needle`
    pub fn reply_when(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.push_rule(Rule::Reply {
            needle: needle.into(),
            reply: reply.into(),
        });
        self
    }

    /// Fail with `error` whenever the prompt contains `needle`
    pub fn fail_when(self, needle: impl Into<String>, error: impl Into<String>) -> Self {
        self.push_rule(Rule::Fail {
            needle: needle.into(),
            error: error.into(),
        });
        self
    }

    fn push_rule(&self, rule: Rule) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(rule);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, model: &str, context: &[ChatMessage]) -> AgentResult<String> {
        let prompt = context
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                prompt: prompt.clone(),
            });
        }

        let rules = self
            .rules
            .lock()
            .map_err(|_| AgentError::LlmError("Scripted rules poisoned".to_string()))?;

        for rule in rules.iter() {
            match rule {
                Rule::Reply { needle, reply } if prompt.contains(needle.as_str()) => {
                    return Ok(reply.clone());
                }
                Rule::Fail { needle, error } if prompt.contains(needle.as_str()) => {
                    return Err(AgentError::LlmError(error.clone()));
                }
                _ => {}
            }
        }

        Ok(format!("[offline] {}", prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let client = ScriptedCompletionClient::new()
            .fail_when("research", "rate limited")
            .reply_when("research", "never used");

        let result = client
            .complete("m", &[ChatMessage::user("please research rust")])
            .await;

        assert!(matches!(result, Err(AgentError::LlmError(e)) if e == "rate limited"));
    }

    #[tokio::test]
    async fn unmatched_prompt_is_echoed_and_recorded() {
        let client = ScriptedCompletionClient::new();
        let context = vec![ChatMessage::system("sys"), ChatMessage::user("hello")];

        let reply = client.complete("gpt-4o-mini", &context).await.unwrap();

        assert_eq!(reply, "[offline] hello");
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gpt-4o-mini");
    }
}
