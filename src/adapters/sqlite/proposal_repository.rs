//! SQLite implementation of `ProposalRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Proposal, ProposalStatus, Triage};
use crate::domain::ports::ProposalRepository;

#[derive(Clone)]
pub struct SqliteProposalRepository {
    pool: SqlitePool,
}

impl SqliteProposalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    repo_path: String,
    title: String,
    description: String,
    rationale: String,
    status: String,
    impact: Option<i64>,
    feasibility: Option<i64>,
    risk: Option<i64>,
    effort: Option<i64>,
    score: Option<i64>,
    reasoning: Option<String>,
    created_at: String,
}

impl TryFrom<Row> for Proposal {
    type Error = DomainError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Proposal {
            id: row.id,
            repo_path: row.repo_path,
            title: row.title,
            description: row.description,
            rationale: row.rationale,
            status: ProposalStatus::from_str(&row.status)
                .ok_or_else(|| DomainError::Serialization(format!("unknown proposal status: {}", row.status)))?,
            triage: Triage {
                impact: row.impact.map(|v| v as u8),
                feasibility: row.feasibility.map(|v| v as u8),
                risk: row.risk.map(|v| v as u8),
                effort: row.effort.map(|v| v as u8),
                score: row.score.map(|v| v as u8),
            },
            reasoning: row.reasoning,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| DomainError::Serialization(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ProposalRepository for SqliteProposalRepository {
    async fn create(&self, proposal: &Proposal) -> DomainResult<i64> {
        let id = sqlx::query(
            "INSERT INTO proposals (repo_path, title, description, rationale, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&proposal.repo_path)
        .bind(&proposal.title)
        .bind(&proposal.description)
        .bind(&proposal.rationale)
        .bind(proposal.status.as_str())
        .bind(proposal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Proposal>> {
        let row: Option<Row> = sqlx::query_as("SELECT * FROM proposals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Proposal::try_from).transpose()
    }

    async fn update(&self, proposal: &Proposal) -> DomainResult<()> {
        sqlx::query(
            "UPDATE proposals SET status = ?, impact = ?, feasibility = ?, risk = ?, effort = ?, score = ?,
             reasoning = ? WHERE id = ?",
        )
        .bind(proposal.status.as_str())
        .bind(proposal.triage.impact.map(i64::from))
        .bind(proposal.triage.feasibility.map(i64::from))
        .bind(proposal.triage.risk.map(i64::from))
        .bind(proposal.triage.effort.map(i64::from))
        .bind(proposal.triage.score.map(i64::from))
        .bind(&proposal.reasoning)
        .bind(proposal.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_status(&self, status: ProposalStatus) -> DomainResult<Vec<Proposal>> {
        let rows: Vec<Row> = sqlx::query_as("SELECT * FROM proposals WHERE status = ? ORDER BY created_at ASC")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Proposal::try_from).collect()
    }
}
