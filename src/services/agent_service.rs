use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::registry::AgentRegistry;
use crate::agents::researcher::ResearchReport;
use crate::agents::types::{AgentReply, AgentSnapshot, CreatedAgentSummary};
use crate::domain::agent::{AgentId, AgentRecord, AgentStatus};
use crate::domain::message::{Message, OPERATOR_SENDER};
use crate::domain::repositories::Repositories;
use crate::execution::bridge::ExecutionBridge;

/// Result of delivering one operator message to an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendResult {
    pub success: bool,
    pub agent_id: AgentId,
    pub agent_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: AgentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAgentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorTaskResult {
    pub success: bool,
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub workflow_id: Option<i64>,
}

/// Agent listing entry: live snapshots once initialized, records before
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentListing {
    Live(AgentSnapshot),
    Stored(AgentRecord),
}

/// Counts for the operator dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_agents: usize,
    pub agents_by_status: BTreeMap<String, usize>,
    pub dynamic_agents: usize,
    pub total_workflows: usize,
    pub workflows_by_status: BTreeMap<String, usize>,
}

/// Synchronous facade the transport layer calls into
///
/// Each operation runs its async work on the execution bridge, so callers
/// must be on plain or blocking-pool threads.
pub struct AgentService {
    bridge: Arc<ExecutionBridge>,
    registry: Arc<AgentRegistry>,
    repos: Repositories,
}

impl AgentService {
    pub fn new(bridge: Arc<ExecutionBridge>, registry: Arc<AgentRegistry>, repos: Repositories) -> Self {
        Self {
            bridge,
            registry,
            repos,
        }
    }

    fn run<T, F>(&self, op: impl FnOnce(Arc<AgentRegistry>, Repositories) -> F) -> AgentResult<T>
    where
        F: Future<Output = AgentResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.bridge
            .run(op(self.registry.clone(), self.repos.clone()))?
    }

    fn ensure_initialized(&self) -> AgentResult<()> {
        if self.registry.is_initialized() {
            Ok(())
        } else {
            Err(AgentError::NotInitialized)
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Creates or adopts the core agents; safe to call repeatedly
    pub fn initialize_core_agents(&self) -> AgentResult<BTreeMap<String, String>> {
        self.run(|registry, _| async move { Ok::<_, AgentError>(registry.initialize_core_agents().await) })
    }

    /// Sends operator text to an agent
    ///
    /// A failed completion is reported with `success: false`; an unknown id
    /// raises `AgentNotFound`.
    pub fn send_message_to_agent(&self, agent_id: AgentId, text: &str) -> AgentResult<SendResult> {
        self.ensure_initialized()?;
        let text = text.to_string();

        self.run(move |registry, _| async move {
            let agent = registry
                .resolve(agent_id)
                .ok_or_else(|| AgentError::AgentNotFound(agent_id.to_string()))?;

            let reply = agent.send_message(&text, Some(OPERATOR_SENDER)).await?;
            let (response, error) = match reply {
                AgentReply::Completed { text } => (Some(text), None),
                AgentReply::Failed { reason } => (None, Some(reason)),
            };

            Ok::<_, AgentError>(SendResult {
                success: error.is_none(),
                agent_id,
                agent_name: agent.name().to_string(),
                response,
                error,
                status: agent.status(),
            })
        })
    }

    pub fn agent_status(&self, agent_id: AgentId) -> AgentResult<Option<AgentSnapshot>> {
        self.ensure_initialized()?;
        Ok(self.registry.status(agent_id))
    }

    /// Live agents, or persisted records before initialization
    pub fn list_agents(&self) -> AgentResult<Vec<AgentListing>> {
        if self.registry.is_initialized() {
            return Ok(self
                .registry
                .list()
                .into_iter()
                .map(AgentListing::Live)
                .collect());
        }

        self.run(|_, repos| async move {
            let records = repos.agents.list().await?;
            Ok::<_, AgentError>(records.into_iter().map(AgentListing::Stored).collect())
        })
    }

    /// Read straight from storage, so it works before initialization
    pub fn conversation_history(&self, agent_id: AgentId, limit: u32) -> AgentResult<Vec<Message>> {
        self.run(move |_, repos| async move {
            Ok::<_, AgentError>(repos.messages.recent_for_agent(agent_id, limit).await?)
        })
    }

    pub fn create_dynamic_agent(
        &self,
        role: &str,
        capabilities: &[String],
        reason: &str,
    ) -> AgentResult<CreateAgentResult> {
        self.ensure_initialized()?;
        let role = role.to_string();
        let capabilities = capabilities.to_vec();
        let reason = reason.to_string();

        self.run(move |registry, _| async move {
            let result = match registry.create_from_request(&role, &capabilities, &reason).await {
                Ok(Some(agent)) => CreateAgentResult {
                    success: true,
                    agent: Some(agent.describe()),
                    error: None,
                },
                Ok(None) => CreateAgentResult {
                    success: false,
                    agent: None,
                    error: Some("Failed to create agent".to_string()),
                },
                Err(AgentError::NotInitialized) => return Err(AgentError::NotInitialized),
                Err(e) => CreateAgentResult {
                    success: false,
                    agent: None,
                    error: Some(e.to_string()),
                },
            };
            Ok::<_, AgentError>(result)
        })
    }

    pub fn process_operator_task(
        &self,
        task: &str,
        workflow_id: Option<i64>,
    ) -> AgentResult<OperatorTaskResult> {
        self.ensure_initialized()?;
        let task = task.to_string();

        self.run(move |registry, _| async move {
            let driver = registry.orchestrator().ok_or(AgentError::NotInitialized)?;
            let reply = driver.process_operator_task(&task, workflow_id).await?;
            let (response, error) = match reply {
                AgentReply::Completed { text } => (Some(text), None),
                AgentReply::Failed { reason } => (None, Some(reason)),
            };

            Ok::<_, AgentError>(OperatorTaskResult {
                success: error.is_none(),
                agent: driver.agent().name().to_string(),
                response,
                error,
                workflow_id,
            })
        })
    }

    pub fn research_topic(&self, topic: &str) -> AgentResult<ResearchReport> {
        self.ensure_initialized()?;
        let topic = topic.to_string();

        self.run(move |registry, _| async move {
            let researcher = registry.researcher().ok_or(AgentError::NotInitialized)?;
            researcher.research_topic(&topic, true).await
        })
    }

    /// Agent-to-agent delivery; `None` when either end is unknown
    pub fn route_message(
        &self,
        sender_id: AgentId,
        recipient_name: &str,
        text: &str,
    ) -> AgentResult<Option<AgentReply>> {
        self.ensure_initialized()?;
        let recipient_name = recipient_name.to_string();
        let text = text.to_string();

        self.run(move |registry, _| async move {
            registry.route(sender_id, &recipient_name, &text).await
        })
    }

    pub fn terminate_agent(&self, agent_id: AgentId) -> AgentResult<bool> {
        self.ensure_initialized()?;
        self.run(move |registry, _| async move { registry.terminate(agent_id).await })
    }

    pub fn created_agents(&self) -> AgentResult<Vec<CreatedAgentSummary>> {
        let factory = self.registry.factory().ok_or(AgentError::NotInitialized)?;
        Ok(factory.created_agents())
    }

    pub fn overview(&self) -> AgentResult<Overview> {
        let dynamic_agents = self.registry.dynamic_count();

        self.run(move |_, repos| async move {
            let agents = repos.agents.list().await?;
            let workflows = repos.workflows.list().await?;

            let mut overview = Overview {
                total_agents: agents.len(),
                dynamic_agents,
                total_workflows: workflows.len(),
                ..Overview::default()
            };
            for agent in &agents {
                *overview
                    .agents_by_status
                    .entry(agent.status.to_string())
                    .or_default() += 1;
            }
            for workflow in &workflows {
                *overview
                    .workflows_by_status
                    .entry(workflow.status().to_string())
                    .or_default() += 1;
            }
            Ok::<_, AgentError>(overview)
        })
    }

    pub fn shutdown(&self) -> AgentResult<()> {
        self.run(|registry, _| async move {
            registry.shutdown().await;
            Ok::<_, AgentError>(())
        })
    }
}
