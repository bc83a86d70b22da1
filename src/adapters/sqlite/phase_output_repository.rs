//! SQLite implementation of `PhaseOutputRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Phase, PhaseOutput};
use crate::domain::ports::PhaseOutputRepository;

#[derive(Clone)]
pub struct SqlitePhaseOutputRepository {
    pool: SqlitePool,
}

impl SqlitePhaseOutputRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    task_id: i64,
    phase: String,
    output: String,
    raw_stream: String,
    exit_code: Option<i64>,
    created_at: String,
}

impl TryFrom<Row> for PhaseOutput {
    type Error = DomainError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(PhaseOutput {
            id: row.id,
            task_id: row.task_id,
            phase: Phase::from_str(&row.phase)
                .ok_or_else(|| DomainError::Serialization(format!("unknown phase: {}", row.phase)))?,
            output: row.output,
            raw_stream: row.raw_stream,
            exit_code: row.exit_code.map(|c| c as i32),
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| DomainError::Serialization(e.to_string()))?,
        })
    }
}

#[async_trait]
impl PhaseOutputRepository for SqlitePhaseOutputRepository {
    async fn append(&self, output: &PhaseOutput) -> DomainResult<i64> {
        let id = sqlx::query(
            "INSERT INTO phase_outputs (task_id, phase, output, raw_stream, exit_code, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(output.task_id)
        .bind(output.phase.as_str())
        .bind(&output.output)
        .bind(&output.raw_stream)
        .bind(output.exit_code)
        .bind(output.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    async fn list_for_task(&self, task_id: i64) -> DomainResult<Vec<PhaseOutput>> {
        let rows: Vec<Row> = sqlx::query_as("SELECT * FROM phase_outputs WHERE task_id = ? ORDER BY id ASC")
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PhaseOutput::try_from).collect()
    }
}
