//! SQLite implementation of `TaskRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskCreator, TaskStatus};
use crate::domain::ports::TaskRepository;

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    repo_path: String,
    branch: String,
    status: String,
    attempt_count: i64,
    max_attempts: i64,
    last_error: Option<String>,
    creator: String,
    notify_channel: String,
    created_at: String,
    updated_at: String,
    resume_session_id: Option<String>,
    dispatched_at: Option<String>,
}

fn parse_ts(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(e.to_string()))
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            repo_path: row.repo_path,
            branch: row.branch,
            status: TaskStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::Serialization(format!("unknown task status: {}", row.status)))?,
            attempt_count: row.attempt_count as u32,
            max_attempts: row.max_attempts as u32,
            last_error: row.last_error,
            creator: TaskCreator::from_str(&row.creator)
                .ok_or_else(|| DomainError::Serialization(format!("unknown task creator: {}", row.creator)))?,
            notify_channel: row.notify_channel,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
            resume_session_id: row.resume_session_id,
            dispatched_at: row.dispatched_at.map(|s| parse_ts(&s)).transpose()?,
        })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &Task) -> DomainResult<i64> {
        let id = sqlx::query(
            r#"INSERT INTO tasks
               (title, description, repo_path, branch, status, attempt_count, max_attempts,
                last_error, creator, notify_channel, created_at, updated_at, resume_session_id, dispatched_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.repo_path)
        .bind(&task.branch)
        .bind(task.status.as_str())
        .bind(task.attempt_count as i64)
        .bind(task.max_attempts as i64)
        .bind(&task.last_error)
        .bind(task.creator.as_str())
        .bind(&task.notify_channel)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .bind(&task.resume_session_id)
        .bind(task.dispatched_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Task::try_from).transpose()
    }

    async fn update(&self, task: &Task) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE tasks SET title = ?, description = ?, repo_path = ?, branch = ?, status = ?,
               attempt_count = ?, max_attempts = ?, last_error = ?, creator = ?, notify_channel = ?,
               updated_at = ?, resume_session_id = ?, dispatched_at = ?
               WHERE id = ?"#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.repo_path)
        .bind(&task.branch)
        .bind(task.status.as_str())
        .bind(task.attempt_count as i64)
        .bind(task.max_attempts as i64)
        .bind(&task.last_error)
        .bind(task.creator.as_str())
        .bind(&task.notify_channel)
        .bind(Utc::now().to_rfc3339())
        .bind(&task.resume_session_id)
        .bind(task.dispatched_at.map(|t| t.to_rfc3339()))
        .bind(task.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_next_active(&self, limit: usize) -> DomainResult<Vec<Task>> {
        // Active statuses only; priority + created_at ordering happens in
        // Rust since SQLite has no notion of our enum's priority() mapping.
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status IN
             ('backlog','spec','qa','qa_fix','impl','retry','rebase')
             ORDER BY created_at ASC LIMIT ?",
        )
        .bind((limit * 4).max(limit) as i64) // overfetch so Rust-side priority sort has enough rows
        .fetch_all(&self.pool)
        .await?;

        let mut tasks: Vec<Task> = rows.into_iter().map(Task::try_from).collect::<Result<_, _>>()?;
        tasks.sort_by(|a, b| a.status.priority().cmp(&b.status.priority()).then(a.created_at.cmp(&b.created_at)));
        tasks.truncate(limit);
        Ok(tasks)
    }

    async fn list_by_status(&self, status: TaskStatus) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE status = ? ORDER BY created_at ASC")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn list_active(&self) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status IN ('backlog','spec','qa','qa_fix','impl','retry','rebase')",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn list_terminal_before(&self, before: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status IN ('merged','failed') AND updated_at < ?",
        )
        .bind(before.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn active_task_count(&self) -> DomainResult<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE status IN ('backlog','spec','qa','qa_fix','impl','retry','rebase')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn mark_dispatched(&self, id: i64) -> DomainResult<()> {
        sqlx::query("UPDATE tasks SET dispatched_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_dispatched(&self, id: i64) -> DomainResult<()> {
        sqlx::query("UPDATE tasks SET dispatched_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_dispatched(&self, id: i64) -> DomainResult<bool> {
        let row: Option<(Option<String>,)> = sqlx::query_as("SELECT dispatched_at FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(v,)| v).is_some())
    }

    async fn clear_all_dispatched(&self) -> DomainResult<()> {
        sqlx::query("UPDATE tasks SET dispatched_at = NULL WHERE dispatched_at IS NOT NULL")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_active_by_title(&self, title: &str) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE title = ? AND status IN
             ('backlog','spec','qa','qa_fix','impl','retry','rebase') LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Task::try_from).transpose()
    }
}
