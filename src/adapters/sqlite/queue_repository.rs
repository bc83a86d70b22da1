//! SQLite implementation of `QueueRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{QueueEntry, QueueStatus};
use crate::domain::ports::QueueRepository;

#[derive(Clone)]
pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QueueRow {
    id: i64,
    task_id: i64,
    branch: String,
    repo_path: String,
    status: String,
    error_message: Option<String>,
    unknown_retries: i64,
    queued_at: String,
    pr_number: Option<i64>,
}

impl TryFrom<QueueRow> for QueueEntry {
    type Error = DomainError;

    fn try_from(row: QueueRow) -> Result<Self, Self::Error> {
        Ok(QueueEntry {
            id: row.id,
            task_id: row.task_id,
            branch: row.branch,
            repo_path: row.repo_path,
            status: QueueStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::Serialization(format!("unknown queue status: {}", row.status)))?,
            error_message: row.error_message,
            unknown_retries: row.unknown_retries as u32,
            queued_at: DateTime::parse_from_rfc3339(&row.queued_at)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| DomainError::Serialization(e.to_string()))?,
            pr_number: row.pr_number,
        })
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn enqueue(&self, task_id: i64, branch: &str, repo_path: &str) -> DomainResult<()> {
        let already_merged: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM queue_entries WHERE task_id = ? AND status = 'merged' LIMIT 1")
                .bind(task_id)
                .fetch_optional(&self.pool)
                .await?;
        if already_merged.is_some() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM queue_entries WHERE task_id = ? AND status = 'queued'")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO queue_entries (task_id, branch, repo_path, status, queued_at) VALUES (?, ?, ?, 'queued', ?)",
        )
        .bind(task_id)
        .bind(branch)
        .bind(repo_path)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> DomainResult<Option<QueueEntry>> {
        let row: Option<QueueRow> = sqlx::query_as("SELECT * FROM queue_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(QueueEntry::try_from).transpose()
    }

    async fn update(&self, entry: &QueueEntry) -> DomainResult<()> {
        sqlx::query(
            "UPDATE queue_entries SET status = ?, error_message = ?, unknown_retries = ?, pr_number = ? WHERE id = ?",
        )
        .bind(entry.status.as_str())
        .bind(&entry.error_message)
        .bind(entry.unknown_retries as i64)
        .bind(entry.pr_number)
        .bind(entry.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_queued(&self, repo_path: &str) -> DomainResult<Vec<QueueEntry>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            "SELECT * FROM queue_entries WHERE repo_path = ? AND status = 'queued' ORDER BY id ASC",
        )
        .bind(repo_path)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(QueueEntry::try_from).collect()
    }

    async fn queued_count(&self) -> DomainResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue_entries WHERE status = 'queued'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn reset_stuck_merging(&self) -> DomainResult<u64> {
        let result = sqlx::query("UPDATE queue_entries SET status = 'queued' WHERE status = 'merging'")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
