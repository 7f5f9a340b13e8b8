use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::domain::agent::{AgentId, AgentKind, AgentRecord, AgentStatus, NewAgentRecord};
use crate::domain::repositories::{AgentRepository, RepoResult, RepositoryError};
use crate::infrastructure::database::db_error;

#[derive(FromRow)]
struct AgentRow {
    id: i64,
    name: String,
    kind: AgentKind,
    role: String,
    status: AgentStatus,
    config: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<AgentRow> for AgentRecord {
    fn from(r: AgentRow) -> Self {
        AgentRecord {
            id: r.id,
            name: r.name,
            kind: r.kind,
            role: r.role,
            status: r.status,
            config: r.config.0,
            created_at: r.created_at,
        }
    }
}

const SELECT_AGENT: &str =
    "SELECT id, name, kind, role, status, config, created_at FROM agents";

/// SQLite implementation of AgentRepository
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: NewAgentRecord) -> RepoResult<AgentRecord> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO agents (name, kind, role, status, config, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&agent.name)
        .bind(agent.kind)
        .bind(&agent.role)
        .bind(agent.status)
        .bind(Json(&agent.config))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create agent", e))?;

        Ok(AgentRecord {
            id: result.last_insert_rowid(),
            name: agent.name,
            kind: agent.kind,
            role: agent.role,
            status: agent.status,
            config: agent.config,
            created_at,
        })
    }

    async fn find_by_id(&self, id: AgentId) -> RepoResult<Option<AgentRecord>> {
        let row = sqlx::query_as::<_, AgentRow>(&format!("{} WHERE id = ?", SELECT_AGENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find agent by id", e))?;

        Ok(row.map(AgentRecord::from))
    }

    async fn find_by_name_and_kind(
        &self,
        name: &str,
        kind: AgentKind,
    ) -> RepoResult<Option<AgentRecord>> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            "{} WHERE name = ? AND kind = ? ORDER BY id LIMIT 1",
            SELECT_AGENT
        ))
        .bind(name)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find agent by name", e))?;

        Ok(row.map(AgentRecord::from))
    }

    async fn list(&self) -> RepoResult<Vec<AgentRecord>> {
        let rows = sqlx::query_as::<_, AgentRow>(&format!("{} ORDER BY id", SELECT_AGENT))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list agents", e))?;

        Ok(rows.into_iter().map(AgentRecord::from).collect())
    }

    async fn update_status(&self, id: AgentId, status: AgentStatus) -> RepoResult<()> {
        let result = sqlx::query("UPDATE agents SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update agent status", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "agent", id });
        }

        Ok(())
    }
}
