//! Generic key/value state repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> DomainResult<()>;

    async fn get_i64(&self, key: &str, default: i64) -> DomainResult<i64> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default))
    }
}
