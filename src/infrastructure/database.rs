use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::domain::repositories::{RepoResult, RepositoryError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS agents (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        kind        TEXT NOT NULL,
        role        TEXT NOT NULL,
        status      TEXT NOT NULL,
        config      TEXT NOT NULL DEFAULT '{}',
        created_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_id    INTEGER NOT NULL REFERENCES agents(id),
        sender      TEXT NOT NULL,
        content     TEXT NOT NULL,
        timestamp   TEXT NOT NULL,
        meta        TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workflows (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL,
        description   TEXT,
        status        TEXT NOT NULL,
        started_at    TEXT NOT NULL,
        completed_at  TEXT,
        meta          TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        workflow_id   INTEGER NOT NULL REFERENCES workflows(id),
        assigned_to   INTEGER REFERENCES agents(id),
        status        TEXT NOT NULL,
        description   TEXT NOT NULL,
        result        TEXT,
        created_at    TEXT NOT NULL,
        completed_at  TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_agent ON messages(agent_id, id)",
];

/// Opens a SQLite pool for `url`
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never reaped.
pub async fn connect(url: &str, max_connections: u32) -> RepoResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| RepositoryError::Database(format!("Invalid database url: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to connect to database: {}", e)))
}

/// Creates the tables if they do not exist yet
pub async fn migrate(pool: &SqlitePool) -> RepoResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to apply schema: {}", e)))?;
    }

    tracing::debug!("Database schema ready");
    Ok(())
}

pub(crate) fn db_error(context: &str, e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(format!("{}: {}", context, e))
}
