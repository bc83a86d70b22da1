//! Integration queue repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::QueueEntry;

#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Skips if a `merged` entry already exists for `task_id`; otherwise
    /// deletes any prior `queued` entry for that task before inserting
    /// (spec.md §3 QueueEntry invariant, §4.1 `enqueue_for_integration`).
    async fn enqueue(&self, task_id: i64, branch: &str, repo_path: &str) -> DomainResult<()>;

    async fn get(&self, id: i64) -> DomainResult<Option<QueueEntry>>;
    async fn update(&self, entry: &QueueEntry) -> DomainResult<()>;

    /// Entries in `queued` status for a given repo, FIFO (ascending id).
    async fn get_queued(&self, repo_path: &str) -> DomainResult<Vec<QueueEntry>>;

    async fn queued_count(&self) -> DomainResult<i64>;

    /// Startup crash recovery: any row stuck in `merging` reverts to `queued`.
    async fn reset_stuck_merging(&self) -> DomainResult<u64>;
}
