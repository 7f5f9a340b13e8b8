use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::domain::repositories::{RepoResult, RepositoryError, TaskRepository};
use crate::domain::workflow::{NewTask, Task, TaskId, TaskStatus, WorkflowId};
use crate::infrastructure::database::db_error;

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    workflow_id: i64,
    assigned_to: Option<i64>,
    status: TaskStatus,
    description: String,
    result: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task::from_persistence(
            r.id,
            r.workflow_id,
            r.assigned_to,
            r.status,
            r.description,
            r.result,
            r.created_at,
            r.completed_at,
        )
    }
}

const SELECT_TASK: &str = "SELECT id, workflow_id, assigned_to, status, description, result, created_at, completed_at FROM tasks";

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: NewTask) -> RepoResult<Task> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (workflow_id, assigned_to, status, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.workflow_id)
        .bind(task.assigned_to)
        .bind(TaskStatus::Pending)
        .bind(&task.description)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create task", e))?;

        Ok(Task::from_persistence(
            result.last_insert_rowid(),
            task.workflow_id,
            Some(task.assigned_to),
            TaskStatus::Pending,
            task.description,
            None,
            created_at,
            None,
        ))
    }

    async fn find_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{} WHERE id = ?", SELECT_TASK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find task by id", e))?;

        Ok(row.map(Task::from))
    }

    async fn save(&self, task: &Task) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?, result = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(task.status())
        .bind(task.result())
        .bind(task.completed_at())
        .bind(task.id())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save task", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "task",
                id: task.id(),
            });
        }

        Ok(())
    }

    async fn find_by_workflow(&self, workflow_id: WorkflowId) -> RepoResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "{} WHERE workflow_id = ? ORDER BY id",
            SELECT_TASK
        ))
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find tasks by workflow", e))?;

        Ok(rows.into_iter().map(Task::from).collect())
    }
}
