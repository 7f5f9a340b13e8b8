use serde::{Deserialize, Serialize};

pub type WorkflowId = i64;
pub type TaskId = i64;

/// Represents the lifecycle status of a workflow
///
/// # Status Transitions
/// ```text
/// Pending -> InProgress -> Completed
///                     \--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Created, not yet started
    Pending,
    /// Stages are executing
    InProgress,
    /// Every stage finished successfully
    Completed,
    /// A stage failed; the cause is recorded in the workflow metadata
    Failed,
}

impl WorkflowStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use agent_orchestra::domain::workflow::WorkflowStatus;
    ///
    /// assert!(WorkflowStatus::Pending.can_transition_to(WorkflowStatus::InProgress));
    /// assert!(!WorkflowStatus::Completed.can_transition_to(WorkflowStatus::InProgress));
    /// ```
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a single workflow task
///
/// Tasks follow the same shape as workflows: `pending -> in_progress ->
/// {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
