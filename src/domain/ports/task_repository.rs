//! Task repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskStatus};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> DomainResult<i64>;
    async fn get(&self, id: i64) -> DomainResult<Option<Task>>;
    async fn update(&self, task: &Task) -> DomainResult<()>;

    /// Tasks with `status.is_active()`, ordered by priority then by
    /// `created_at` ascending, limited to `limit` rows (spec.md §4.2 step 1).
    async fn get_next_active(&self, limit: usize) -> DomainResult<Vec<Task>>;

    async fn list_by_status(&self, status: TaskStatus) -> DomainResult<Vec<Task>>;
    async fn list_active(&self) -> DomainResult<Vec<Task>>;
    async fn list_terminal_before(&self, before: chrono::DateTime<chrono::Utc>) -> DomainResult<Vec<Task>>;

    async fn active_task_count(&self) -> DomainResult<i64>;

    async fn mark_dispatched(&self, id: i64) -> DomainResult<()>;
    async fn clear_dispatched(&self, id: i64) -> DomainResult<()>;
    async fn is_dispatched(&self, id: i64) -> DomainResult<bool>;

    /// Crash recovery: clear every dispatched flag in the database.
    async fn clear_all_dispatched(&self) -> DomainResult<()>;

    /// Find an existing active/dedupe-relevant task by title, used by the
    /// health monitor to avoid filing duplicate repair tasks.
    async fn find_active_by_title(&self, title: &str) -> DomainResult<Option<Task>>;
}
