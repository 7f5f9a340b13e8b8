use async_trait::async_trait;

use super::RepoResult;
use crate::domain::workflow::{NewWorkflow, Workflow, WorkflowId};

/// Repository trait for the Workflow aggregate
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Persist a new workflow in `pending`
    async fn create(&self, workflow: NewWorkflow) -> RepoResult<Workflow>;

    async fn find_by_id(&self, id: WorkflowId) -> RepoResult<Option<Workflow>>;

    /// Write back status, timestamps and metadata of an existing workflow
    async fn save(&self, workflow: &Workflow) -> RepoResult<()>;

    /// All workflows, newest first
    async fn list(&self) -> RepoResult<Vec<Workflow>>;
}
