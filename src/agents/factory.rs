use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::agent::Agent;
use super::completion::CompletionClient;
use super::errors::{AgentError, AgentResult};
use super::messages::MessageMeta;
use super::prompts::{library, vars};
use super::types::{AgentProfile, AgentSpec, CreatedAgentSummary};
use crate::domain::agent::{AgentKind, AgentStatus, NewAgentRecord};

pub const FACTORY_NAME: &str = "Generator";

struct CreatedEntry {
    spec: AgentSpec,
    agent: Arc<Agent>,
    created_at: DateTime<Utc>,
}

/// The HR agent: designs specifications and instantiates dynamic agents
pub struct FactoryAgent {
    agent: Arc<Agent>,
    completion: Arc<dyn CompletionClient>,
    default_model: String,
    created: Mutex<BTreeMap<String, CreatedEntry>>,
}

/// Tools inferred from capability names
///
/// A heuristic only; nothing guarantees the tools exist.
pub fn infer_tools(capabilities: &[String]) -> Vec<String> {
    let has = |needle: &str| capabilities.iter().any(|c| c.eq_ignore_ascii_case(needle));

    let mut tools = Vec::new();
    if has("coding") {
        tools.push("code_executor".to_string());
    }
    if has("research") {
        tools.push("web_search".to_string());
        tools.push("rag_search".to_string());
    }
    tools
}

/// Agent name derived from a role label
pub fn name_for_role(role: &str) -> String {
    role.split_whitespace().collect()
}

impl FactoryAgent {
    pub fn profile(model: &str) -> AgentProfile {
        AgentProfile {
            name: FACTORY_NAME.to_string(),
            role: "HR Manager and Agent Creator".to_string(),
            kind: AgentKind::Factory,
            description: "Agent creator that designs and instantiates new specialized agents"
                .to_string(),
            system_prompt: library::FACTORY_SYSTEM.to_string(),
            model: model.to_string(),
        }
    }

    pub fn new(
        agent: Arc<Agent>,
        completion: Arc<dyn CompletionClient>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            completion,
            default_model: default_model.into(),
            created: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    async fn note(&self, content: &str, meta: MessageMeta) {
        if let Err(e) = self.agent.log_message(content, self.agent.name(), meta).await {
            tracing::warn!(error = %e, "Failed to log factory message");
        }
    }

    /// Designs a specification for a new dynamic agent
    ///
    /// The system prompt is written by the completion service; if that call
    /// fails a templated prompt is used instead.
    pub async fn design_spec(
        &self,
        role: &str,
        capabilities: &[String],
        requirements: serde_json::Map<String, Value>,
    ) -> AgentResult<AgentSpec> {
        let requirement_lines = if requirements.is_empty() {
            String::new()
        } else {
            let lines: String = requirements
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("- {}: {}\n", k, s),
                    other => format!("- {}: {}\n", k, other),
                })
                .collect();
            format!("\nAdditional Requirements:\n{}", lines)
        };

        let prompt = library::agent_design().render(&vars([
            ("role", role.to_string()),
            ("capabilities", capabilities.join(", ")),
            ("requirements", requirement_lines),
        ]));

        let system_prompt = match self.agent.send_message(&prompt, None).await?.into_result() {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!(role, error = %reason, "Using templated system prompt");
                library::fallback_agent_prompt().render(&vars([
                    ("role", role.to_string()),
                    ("capabilities", capabilities.join(", ")),
                ]))
            }
        };

        Ok(AgentSpec {
            name: name_for_role(role),
            role: role.to_string(),
            kind: AgentKind::Dynamic,
            capabilities: capabilities.to_vec(),
            system_prompt,
            description: format!("Specialized agent for {}", role.to_lowercase()),
            model: self.default_model.clone(),
            tools: infer_tools(capabilities),
            requirements,
        })
    }

    /// Builds, persists and records a new agent
    ///
    /// Returns `None` after logging the failure on this agent's own log when
    /// the spec is unusable or the record cannot be persisted.
    pub async fn instantiate(&self, spec: &AgentSpec) -> Option<Arc<Agent>> {
        match self.try_instantiate(spec).await {
            Ok(agent) => {
                self.note(
                    &format!("Created new agent: {} ({})", spec.name, spec.role),
                    MessageMeta::AgentCreated {
                        agent_name: spec.name.clone(),
                        agent_id: agent.id(),
                    },
                )
                .await;
                tracing::info!(agent = %spec.name, role = %spec.role, "Created dynamic agent");
                Some(agent)
            }
            Err(e) => {
                let error = e.to_string();
                tracing::error!(agent = %spec.name, error = %error, "Failed to create agent");
                self.note(
                    &format!("Failed to create agent: {}", error),
                    MessageMeta::Error { error, tool: None },
                )
                .await;
                None
            }
        }
    }

    async fn try_instantiate(&self, spec: &AgentSpec) -> AgentResult<Arc<Agent>> {
        if spec.name.trim().is_empty() {
            return Err(AgentError::Validation(
                "Agent name cannot be empty".to_string(),
            ));
        }

        let repos = self.agent.repositories().clone();
        let agent = Arc::new(Agent::new(spec.profile(), self.completion.clone(), repos.clone()));

        let record = repos
            .agents
            .create(NewAgentRecord {
                name: spec.name.clone(),
                kind: AgentKind::Dynamic,
                role: spec.role.clone(),
                status: AgentStatus::Active,
                config: serde_json::to_value(spec)?,
            })
            .await?;
        agent.attach(record.id);

        if let Ok(mut created) = self.created.lock() {
            created.insert(
                spec.name.clone(),
                CreatedEntry {
                    spec: spec.clone(),
                    agent: agent.clone(),
                    created_at: record.created_at,
                },
            );
        }

        Ok(agent)
    }

    /// Designs then instantiates an agent for a staffing request
    pub async fn create_from_request(
        &self,
        role: &str,
        capabilities: &[String],
        reason: &str,
    ) -> AgentResult<Option<Arc<Agent>>> {
        let mut requirements = serde_json::Map::new();
        requirements.insert("reason".to_string(), json!(reason));

        let spec = self.design_spec(role, capabilities, requirements).await?;
        Ok(self.instantiate(&spec).await)
    }

    pub fn created_agents(&self) -> Vec<CreatedAgentSummary> {
        let Ok(created) = self.created.lock() else {
            return Vec::new();
        };

        created
            .values()
            .map(|entry| CreatedAgentSummary {
                id: entry.agent.id(),
                name: entry.spec.name.clone(),
                role: entry.spec.role.clone(),
                capabilities: entry.spec.capabilities.clone(),
                status: entry.agent.status(),
                created_at: entry.created_at,
            })
            .collect()
    }

    /// Drops `name` from the ledger; `false` if this factory never created it
    pub async fn forget(&self, name: &str) -> bool {
        let removed = self
            .created
            .lock()
            .map(|mut created| created.remove(name).is_some())
            .unwrap_or(false);

        if removed {
            self.note(
                &format!("Terminated agent: {}", name),
                MessageMeta::AgentTerminated {
                    agent_name: name.to_string(),
                },
            )
            .await;
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coding_capability_implies_code_executor() {
        let tools = infer_tools(&["Coding".to_string(), "testing".to_string()]);
        assert_eq!(tools, vec!["code_executor"]);
    }

    #[test]
    fn research_capability_implies_search_tools() {
        let tools = infer_tools(&["research".to_string()]);
        assert_eq!(tools, vec!["web_search", "rag_search"]);
    }

    #[test]
    fn name_strips_whitespace() {
        assert_eq!(name_for_role("Python Developer"), "PythonDeveloper");
        assert_eq!(name_for_role("Tester"), "Tester");
    }
}
