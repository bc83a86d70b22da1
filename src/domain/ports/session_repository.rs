//! Agent session repository port.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::Session;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn upsert(&self, session: &Session) -> DomainResult<()>;
    async fn get(&self, folder: &str) -> DomainResult<Option<Session>>;
    async fn delete(&self, folder: &str) -> DomainResult<()>;

    /// Expire (delete) sessions older than `max_age` to bound growth.
    async fn expire_older_than(&self, max_age: Duration) -> DomainResult<u64>;
}
