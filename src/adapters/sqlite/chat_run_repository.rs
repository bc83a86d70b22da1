//! SQLite implementation of `ChatRunRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatAgentRun, ChatAgentRunStatus};
use crate::domain::ports::ChatRunRepository;

#[derive(Clone)]
pub struct SqliteChatRunRepository {
    pool: SqlitePool,
}

impl SqliteChatRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRunRepository for SqliteChatRunRepository {
    async fn create(&self, folder: &str) -> DomainResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = sqlx::query(
            "INSERT INTO chat_agent_runs (folder, status, created_at, updated_at) VALUES (?, 'running', ?, ?)",
        )
        .bind(folder)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    async fn update_status(&self, id: i64, status: ChatAgentRunStatus) -> DomainResult<()> {
        sqlx::query("UPDATE chat_agent_runs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn abandon_running(&self) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE chat_agent_runs SET status = 'abandoned', updated_at = ? WHERE status = 'running'",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn get(&self, id: i64) -> DomainResult<Option<ChatAgentRun>> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT id, folder, status, created_at, updated_at FROM chat_agent_runs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, folder, status, created_at, updated_at)| {
            Ok(ChatAgentRun {
                id,
                folder,
                status: ChatAgentRunStatus::from_str(&status)
                    .ok_or_else(|| DomainError::Serialization(format!("unknown chat run status: {status}")))?,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| DomainError::Serialization(e.to_string()))?,
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| DomainError::Serialization(e.to_string()))?,
            })
        })
        .transpose()
    }
}
