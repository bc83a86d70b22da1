//! SQLite-backed Store (spec.md §4.1): a single-writer database exposing
//! every typed repository port plus whole-database predicates.

mod chat_run_repository;
mod connection;
mod event_repository;
mod migrations;
mod phase_output_repository;
mod proposal_repository;
mod queue_repository;
mod session_repository;
mod state_repository;
mod task_repository;

pub use chat_run_repository::SqliteChatRunRepository;
pub use connection::ConnectionError;
pub use event_repository::SqliteEventRepository;
pub use phase_output_repository::SqlitePhaseOutputRepository;
pub use proposal_repository::SqliteProposalRepository;
pub use queue_repository::SqliteQueueRepository;
pub use session_repository::SqliteSessionRepository;
pub use state_repository::SqliteStateRepository;
pub use task_repository::SqliteTaskRepository;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{
    ChatRunRepository, EventRepository, PhaseOutputRepository, ProposalRepository, QueueRepository,
    SessionRepository, StateRepository, TaskRepository,
};

/// Bundles every repository over one pool. Each field is also usable
/// standalone through its trait object for services that only need one.
#[derive(Clone)]
pub struct Store {
    pub tasks: Arc<SqliteTaskRepository>,
    pub queue: Arc<SqliteQueueRepository>,
    pub phase_outputs: Arc<SqlitePhaseOutputRepository>,
    pub sessions: Arc<SqliteSessionRepository>,
    pub proposals: Arc<SqliteProposalRepository>,
    pub events: Arc<SqliteEventRepository>,
    pub state: Arc<SqliteStateRepository>,
    pub chat_runs: Arc<SqliteChatRunRepository>,
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(db_path: &str) -> Result<Self, ConnectionError> {
        let pool = connection::create_pool(db_path).await?;
        Ok(Self::from_pool(pool))
    }

    pub async fn connect_memory() -> Result<Self, ConnectionError> {
        let pool = connection::create_memory_pool().await?;
        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
            queue: Arc::new(SqliteQueueRepository::new(pool.clone())),
            phase_outputs: Arc::new(SqlitePhaseOutputRepository::new(pool.clone())),
            sessions: Arc::new(SqliteSessionRepository::new(pool.clone())),
            proposals: Arc::new(SqliteProposalRepository::new(pool.clone())),
            events: Arc::new(SqliteEventRepository::new(pool.clone())),
            state: Arc::new(SqliteStateRepository::new(pool.clone())),
            chat_runs: Arc::new(SqliteChatRunRepository::new(pool.clone())),
            pool,
        }
    }

    /// Run all embedded migrations; idempotent (spec.md §4.1).
    pub async fn migrate(&self) -> Result<usize, migrations::MigrationError> {
        migrations::Migrator::new(self.pool.clone())
            .run(migrations::all_embedded_migrations())
            .await
    }

    /// Crash-recovery and startup resets performed once at supervisor boot
    /// (spec.md §4.2 "Crash recovery", §4.4 "Stuck-`merging` recovery",
    /// ChatAgentRun startup rule in spec.md §3).
    pub async fn reset_for_startup(&self) -> DomainResult<()> {
        self.tasks.clear_all_dispatched().await?;
        self.queue.reset_stuck_merging().await?;
        self.chat_runs.abandon_running().await?;
        Ok(())
    }

    pub async fn active_task_count(&self) -> DomainResult<i64> {
        self.tasks.active_task_count().await
    }

    pub async fn queued_integration_count(&self) -> DomainResult<i64> {
        self.queue.queued_count().await
    }
}
