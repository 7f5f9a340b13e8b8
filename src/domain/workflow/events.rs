use serde::Serialize;

use super::value_objects::{TaskId, TaskStatus, WorkflowId};
use crate::domain::agent::AgentKind;

/// Domain events that occur within the Workflow aggregate
///
/// These are handed to the event-publish port as `(name, payload)` pairs so
/// the transport layer can relay progress to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkflowEvent {
    /// Fired when a workflow is persisted in `pending`
    Created { workflow_id: WorkflowId, name: String },
    /// Fired when a workflow moves to `in_progress`
    Started { workflow_id: WorkflowId },
    /// Fired after every executed step
    TaskUpdated {
        workflow_id: WorkflowId,
        task_id: TaskId,
        agent: AgentKind,
        status: TaskStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<String>,
    },
    /// Fired when every stage succeeded
    Completed { workflow_id: WorkflowId },
    /// Fired when a stage failed
    Failed {
        workflow_id: WorkflowId,
        reason: String,
    },
}

impl WorkflowEvent {
    /// Event name used on the publish port
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Created { .. } => "workflow_created",
            WorkflowEvent::Started { .. } => "workflow_started",
            WorkflowEvent::TaskUpdated { .. } => "task_update",
            WorkflowEvent::Completed { .. } => "workflow_completed",
            WorkflowEvent::Failed { .. } => "workflow_failed",
        }
    }

    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            WorkflowEvent::Created { workflow_id, .. } => *workflow_id,
            WorkflowEvent::Started { workflow_id } => *workflow_id,
            WorkflowEvent::TaskUpdated { workflow_id, .. } => *workflow_id,
            WorkflowEvent::Completed { workflow_id } => *workflow_id,
            WorkflowEvent::Failed { workflow_id, .. } => *workflow_id,
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names() {
        assert_eq!(
            WorkflowEvent::Started { workflow_id: 1 }.name(),
            "workflow_started"
        );
        assert_eq!(
            WorkflowEvent::Failed {
                workflow_id: 1,
                reason: "boom".to_string()
            }
            .name(),
            "workflow_failed"
        );
    }

    #[test]
    fn task_update_payload_carries_status() {
        let event = WorkflowEvent::TaskUpdated {
            workflow_id: 7,
            task_id: 3,
            agent: AgentKind::Researcher,
            status: TaskStatus::Completed,
            response: Some("done".to_string()),
        };

        let payload = event.payload();
        assert_eq!(event.workflow_id(), 7);
        assert_eq!(payload["task_id"], 3);
        assert_eq!(payload["agent"], "researcher");
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["response"], "done");
    }
}
