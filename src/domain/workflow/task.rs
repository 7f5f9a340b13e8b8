use chrono::{DateTime, Utc};
use serde::Serialize;

use super::value_objects::{TaskId, TaskStatus, WorkflowId};
use crate::domain::agent::AgentId;
use crate::domain::errors::DomainError;

/// Data required to persist a new task in `pending`
#[derive(Debug, Clone)]
pub struct NewTask {
    pub workflow_id: WorkflowId,
    pub assigned_to: AgentId,
    pub description: String,
}

/// One stage of a workflow, assigned to exactly one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    id: TaskId,
    workflow_id: WorkflowId,
    assigned_to: Option<AgentId>,
    status: TaskStatus,
    description: String,
    result: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(TaskStatus::InProgress)
    }

    /// Marks the task completed and stores the agent's response
    pub fn complete(&mut self, result: impl Into<String>) -> Result<(), DomainError> {
        self.transition(TaskStatus::Completed)?;
        self.result = Some(result.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the task failed, keeping the error as its result
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        self.transition(TaskStatus::Failed)?;
        self.result = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                entity: "task",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn assigned_to(&self) -> Option<AgentId> {
        self.assigned_to
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Reconstructs a Task from persistence layer data
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: TaskId,
        workflow_id: WorkflowId,
        assigned_to: Option<AgentId>,
        status: TaskStatus,
        description: String,
        result: Option<String>,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            assigned_to,
            status,
            description,
            result,
            created_at,
            completed_at,
        }
    }
}
