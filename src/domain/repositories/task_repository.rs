use async_trait::async_trait;

use super::RepoResult;
use crate::domain::workflow::{NewTask, Task, TaskId, WorkflowId};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> RepoResult<Task>;

    async fn find_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;

    async fn save(&self, task: &Task) -> RepoResult<()>;

    /// Tasks of one workflow in creation order
    async fn find_by_workflow(&self, workflow_id: WorkflowId) -> RepoResult<Vec<Task>>;
}
