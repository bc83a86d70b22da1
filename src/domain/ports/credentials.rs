//! Credential refresh port (spec.md §4.5 "refreshes the OAuth token").

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// Returns a fresh bearer token, refreshing and caching it if the
    /// previously cached one has expired.
    async fn refresh(&self) -> DomainResult<String>;
}
