use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::events::WorkflowEvent;
use super::value_objects::{WorkflowId, WorkflowStatus};
use crate::domain::errors::DomainError;

/// Data required to persist a new workflow
///
/// # Business Rules Enforced
/// - Name must not be empty
/// - `initial_task` is recorded in the metadata document
#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub meta: Value,
}

impl NewWorkflow {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        initial_task: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Workflow name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            description,
            meta: json!({ "initial_task": initial_task.into() }),
        })
    }
}

/// Workflow aggregate root
///
/// A persisted unit of multi-stage work. Enforces the monotonic lifecycle
/// `pending -> in_progress -> {completed | failed}`; a workflow that reached a
/// terminal state never re-enters `in_progress`.
///
/// # Invariants
/// - Status transitions must follow `WorkflowStatus::can_transition_to`
/// - `completed_at` is set exactly when a terminal state is reached
/// - On failure the cause is stored under `meta.error`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    description: Option<String>,
    status: WorkflowStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    meta: Value,
}

impl Workflow {
    /// Starts the workflow (transitions from Pending to InProgress)
    ///
    /// # Returns
    /// * `Ok(WorkflowEvent)` - Started event generated
    /// * `Err(DomainError)` - If the workflow is not pending
    pub fn start(&mut self) -> Result<WorkflowEvent, DomainError> {
        self.transition(WorkflowStatus::InProgress)?;
        self.started_at = Utc::now();

        Ok(WorkflowEvent::Started {
            workflow_id: self.id,
        })
    }

    /// Completes the workflow successfully
    pub fn complete(&mut self) -> Result<WorkflowEvent, DomainError> {
        self.transition(WorkflowStatus::Completed)?;
        self.completed_at = Some(Utc::now());

        Ok(WorkflowEvent::Completed {
            workflow_id: self.id,
        })
    }

    /// Marks the workflow as failed and records the reason in its metadata
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<WorkflowEvent, DomainError> {
        let reason = reason.into();
        self.transition(WorkflowStatus::Failed)?;
        self.completed_at = Some(Utc::now());

        if !self.meta.is_object() {
            self.meta = json!({});
        }
        self.meta["error"] = Value::String(reason.clone());

        Ok(WorkflowEvent::Failed {
            workflow_id: self.id,
            reason,
        })
    }

    fn transition(&mut self, next: WorkflowStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                entity: "workflow",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn meta(&self) -> &Value {
        &self.meta
    }

    /// The task text the workflow was created for
    pub fn initial_task(&self) -> Option<&str> {
        self.meta.get("initial_task").and_then(Value::as_str)
    }

    /// The failure cause, once the workflow has failed
    pub fn error(&self) -> Option<&str> {
        self.meta.get("error").and_then(Value::as_str)
    }

    /// Reconstructs a Workflow from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: WorkflowId,
        name: String,
        description: Option<String>,
        status: WorkflowStatus,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        meta: Value,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status,
            started_at,
            completed_at,
            meta,
        }
    }
}
