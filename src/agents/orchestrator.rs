use std::sync::Arc;

use super::agent::Agent;
use super::errors::AgentResult;
use super::messages::MessageMeta;
use super::prompts::{library, vars};
use super::types::{AgentProfile, AgentReply};
use crate::domain::agent::AgentKind;
use crate::domain::message::OPERATOR_SENDER;

pub const ORCHESTRATOR_NAME: &str = "Driver";

/// The CEO agent: takes operator tasks and delegates them
pub struct OrchestratorAgent {
    agent: Arc<Agent>,
}

impl OrchestratorAgent {
    pub fn profile(model: &str) -> AgentProfile {
        AgentProfile {
            name: ORCHESTRATOR_NAME.to_string(),
            role: "CEO and Task Orchestrator".to_string(),
            kind: AgentKind::Orchestrator,
            description: "CEO agent that orchestrates tasks and delegates to other agents"
                .to_string(),
            system_prompt: library::ORCHESTRATOR_SYSTEM.to_string(),
            model: model.to_string(),
        }
    }

    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Hands an operator task to the agent, tagged with its workflow if any
    pub async fn process_operator_task(
        &self,
        task: &str,
        workflow_id: Option<i64>,
    ) -> AgentResult<AgentReply> {
        let mut message = library::operator_task().render(&vars([("task", task.to_string())]));
        if let Some(id) = workflow_id {
            message.push_str(&format!("\nWorkflow ID: {}", id));
        }

        self.agent
            .send_message(&message, Some(OPERATOR_SENDER))
            .await
    }

    /// Records a delegation to the researcher and returns its text
    pub async fn delegate_to_researcher(
        &self,
        task: &str,
        context: Option<&str>,
    ) -> AgentResult<String> {
        let mut delegation = format!("DELEGATION TO CREATOR:\nTask: {}", task);
        if let Some(context) = context {
            delegation.push_str(&format!("\nContext: {}", context));
        }

        self.agent
            .log_message(
                &delegation,
                self.agent.name(),
                MessageMeta::Delegation {
                    target: AgentKind::Researcher.to_string(),
                },
            )
            .await?;

        Ok(delegation)
    }

    /// Records a staffing request for the factory and returns its text
    pub async fn request_new_agent(
        &self,
        role: &str,
        capabilities: &[String],
        reason: &str,
    ) -> AgentResult<String> {
        let request = format!(
            "REQUEST TO GENERATOR:\nRole: {}\nCapabilities: {}\nReason: {}\n",
            role,
            capabilities.join(", "),
            reason
        );

        self.agent
            .log_message(
                &request,
                self.agent.name(),
                MessageMeta::AgentRequest {
                    role: role.to_string(),
                },
            )
            .await?;

        Ok(request)
    }
}
