use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::domain::agent::AgentId;
use crate::domain::message::{Message, NewMessage};
use crate::domain::repositories::{MessageRepository, RepoResult};
use crate::infrastructure::database::db_error;

#[derive(FromRow)]
struct MessageRow {
    id: i64,
    agent_id: i64,
    sender: String,
    content: String,
    timestamp: DateTime<Utc>,
    meta: Json<serde_json::Value>,
}

impl From<MessageRow> for Message {
    fn from(r: MessageRow) -> Self {
        Message {
            id: r.id,
            agent_id: r.agent_id,
            sender: r.sender,
            content: r.content,
            timestamp: r.timestamp,
            meta: r.meta.0,
        }
    }
}

/// SQLite implementation of MessageRepository
///
/// History is ordered by row id, which is the append order.
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: NewMessage) -> RepoResult<Message> {
        let timestamp = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (agent_id, sender, content, timestamp, meta)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.agent_id)
        .bind(&message.sender)
        .bind(&message.content)
        .bind(timestamp)
        .bind(Json(&message.meta))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to append message", e))?;

        Ok(Message {
            id: result.last_insert_rowid(),
            agent_id: message.agent_id,
            sender: message.sender,
            content: message.content,
            timestamp,
            meta: message.meta,
        })
    }

    async fn recent_for_agent(&self, agent_id: AgentId, limit: u32) -> RepoResult<Vec<Message>> {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, agent_id, sender, content, timestamp, meta
            FROM messages
            WHERE agent_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(agent_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load conversation history", e))?;

        rows.reverse();
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn count_for_agent(&self, agent_id: AgentId) -> RepoResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count messages", e))?;

        Ok(count.max(0) as u64)
    }
}
