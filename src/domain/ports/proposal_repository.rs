//! Proposal repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Proposal, ProposalStatus};

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn create(&self, proposal: &Proposal) -> DomainResult<i64>;
    async fn get(&self, id: i64) -> DomainResult<Option<Proposal>>;
    async fn update(&self, proposal: &Proposal) -> DomainResult<()>;
    async fn list_by_status(&self, status: ProposalStatus) -> DomainResult<Vec<Proposal>>;
}
