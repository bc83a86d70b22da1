//! Chat-triggered agent run repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ChatAgentRun;

#[async_trait]
pub trait ChatRunRepository: Send + Sync {
    async fn create(&self, folder: &str) -> DomainResult<i64>;
    async fn update_status(&self, id: i64, status: crate::domain::models::ChatAgentRunStatus) -> DomainResult<()>;

    /// Startup recovery: reset every `running` row to `abandoned`.
    async fn abandon_running(&self) -> DomainResult<u64>;

    #[allow(dead_code)]
    async fn get(&self, id: i64) -> DomainResult<Option<ChatAgentRun>>;
}
