//! SQLite implementation of `SessionRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Session;
use crate::domain::ports::SessionRepository;

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn upsert(&self, session: &Session) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO sessions (folder, session_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(folder) DO UPDATE SET session_id = excluded.session_id, created_at = excluded.created_at",
        )
        .bind(&session.folder)
        .bind(&session.session_id)
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, folder: &str) -> DomainResult<Option<Session>> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT folder, session_id, created_at FROM sessions WHERE folder = ?")
                .bind(folder)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(folder, session_id, created_at)| {
            Ok(Session {
                folder,
                session_id,
                created_at: parse_ts(&created_at)?,
            })
        })
        .transpose()
    }

    async fn delete(&self, folder: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM sessions WHERE folder = ?")
            .bind(folder)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn expire_older_than(&self, max_age: Duration) -> DomainResult<u64> {
        let cutoff = Utc::now() - max_age;
        let result = sqlx::query("DELETE FROM sessions WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn parse_ts(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(e.to_string()))
}
