use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::domain::repositories::{RepoResult, RepositoryError, WorkflowRepository};
use crate::domain::workflow::{NewWorkflow, Workflow, WorkflowId, WorkflowStatus};
use crate::infrastructure::database::db_error;

#[derive(FromRow)]
struct WorkflowRow {
    id: i64,
    name: String,
    description: Option<String>,
    status: WorkflowStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    meta: Json<serde_json::Value>,
}

impl From<WorkflowRow> for Workflow {
    fn from(r: WorkflowRow) -> Self {
        Workflow::from_persistence(
            r.id,
            r.name,
            r.description,
            r.status,
            r.started_at,
            r.completed_at,
            r.meta.0,
        )
    }
}

const SELECT_WORKFLOW: &str =
    "SELECT id, name, description, status, started_at, completed_at, meta FROM workflows";

/// SQLite implementation of WorkflowRepository
pub struct SqliteWorkflowRepository {
    pool: SqlitePool,
}

impl SqliteWorkflowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for SqliteWorkflowRepository {
    async fn create(&self, workflow: NewWorkflow) -> RepoResult<Workflow> {
        let started_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (name, description, status, started_at, meta)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(WorkflowStatus::Pending)
        .bind(started_at)
        .bind(Json(&workflow.meta))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create workflow", e))?;

        Ok(Workflow::from_persistence(
            result.last_insert_rowid(),
            workflow.name,
            workflow.description,
            WorkflowStatus::Pending,
            started_at,
            None,
            workflow.meta,
        ))
    }

    async fn find_by_id(&self, id: WorkflowId) -> RepoResult<Option<Workflow>> {
        let row = sqlx::query_as::<_, WorkflowRow>(&format!("{} WHERE id = ?", SELECT_WORKFLOW))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find workflow by id", e))?;

        Ok(row.map(Workflow::from))
    }

    async fn save(&self, workflow: &Workflow) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET status = ?, started_at = ?, completed_at = ?, meta = ?
            WHERE id = ?
            "#,
        )
        .bind(workflow.status())
        .bind(workflow.started_at())
        .bind(workflow.completed_at())
        .bind(Json(workflow.meta()))
        .bind(workflow.id())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save workflow", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "workflow",
                id: workflow.id(),
            });
        }

        Ok(())
    }

    async fn list(&self) -> RepoResult<Vec<Workflow>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(&format!("{} ORDER BY id DESC", SELECT_WORKFLOW))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list workflows", e))?;

        Ok(rows.into_iter().map(Workflow::from).collect())
    }
}
