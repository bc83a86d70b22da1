//! Phase output repository port: append-only, used for operator inspection
//! and live streaming.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::PhaseOutput;

#[async_trait]
pub trait PhaseOutputRepository: Send + Sync {
    async fn append(&self, output: &PhaseOutput) -> DomainResult<i64>;
    async fn list_for_task(&self, task_id: i64) -> DomainResult<Vec<PhaseOutput>>;
}
