use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::agent::AgentKind;
use crate::domain::workflow::{TaskId, WorkflowId};

/// One executed step as remembered in memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub task_id: TaskId,
    pub agent: AgentKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory context of a running workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowContext {
    pub steps: Vec<StepRecord>,
    pub current_step: usize,
}

/// Mutex-guarded map of workflows currently being driven in this process
///
/// Claiming an id is the in-process guard against two concurrent starts of
/// the same workflow.
#[derive(Default)]
pub struct ActiveWorkflows {
    inner: Mutex<HashMap<WorkflowId, WorkflowContext>>,
}

impl ActiveWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WorkflowId, WorkflowContext>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// `false` if the workflow is already claimed
    pub fn claim(&self, id: WorkflowId) -> bool {
        let mut active = self.lock();
        if active.contains_key(&id) {
            return false;
        }
        active.insert(id, WorkflowContext::default());
        true
    }

    pub fn release(&self, id: WorkflowId) {
        self.lock().remove(&id);
    }

    pub fn record_step(&self, id: WorkflowId, step: StepRecord) {
        if let Some(context) = self.lock().get_mut(&id) {
            context.steps.push(step);
            context.current_step = context.steps.len();
        }
    }

    pub fn is_active(&self, id: WorkflowId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn context(&self, id: WorkflowId) -> Option<WorkflowContext> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_refused() {
        let active = ActiveWorkflows::new();
        assert!(active.claim(1));
        assert!(!active.claim(1));

        active.release(1);
        assert!(active.claim(1));
    }

    #[test]
    fn steps_only_recorded_for_claimed_workflows() {
        let active = ActiveWorkflows::new();
        let step = StepRecord {
            task_id: 3,
            agent: AgentKind::Orchestrator,
            message: "go".to_string(),
            timestamp: Utc::now(),
        };

        active.record_step(9, step.clone());
        assert!(active.context(9).is_none());

        active.claim(9);
        active.record_step(9, step);
        let context = active.context(9).unwrap();
        assert_eq!(context.steps.len(), 1);
        assert_eq!(context.current_step, 1);
    }
}
