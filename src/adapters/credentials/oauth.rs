//! Shells out to the configured credential helper to mint an OAuth token,
//! caching the result until it expires.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::CredentialRefresher;

use super::token::{Token, TokenSlot};

const NO_CREDENTIALS_HELPER_PLACEHOLDER: &str = "no-credentials-helper-configured";
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(55 * 60);

struct Cached {
    slot: TokenSlot,
    fetched_at: Option<Instant>,
}

/// Refreshes a token by invoking an external helper binary and reading its
/// stdout, verbatim, as the token value.
pub struct OAuthCredentialRefresher {
    helper_command: Vec<String>,
    ttl: Duration,
    cached: Mutex<Cached>,
}

impl OAuthCredentialRefresher {
    pub fn new(helper_command: Vec<String>) -> Self {
        Self {
            helper_command,
            ttl: DEFAULT_TOKEN_TTL,
            cached: Mutex::new(Cached {
                slot: TokenSlot::new(),
                fetched_at: None,
            }),
        }
    }

    async fn fetch(&self) -> DomainResult<String> {
        let Some((program, args)) = self.helper_command.split_first() else {
            return Ok(NO_CREDENTIALS_HELPER_PLACEHOLDER.to_string());
        };

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| DomainError::Substrate(format!("credential helper spawn failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::Substrate(format!("credential helper failed: {stderr}")));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl CredentialRefresher for OAuthCredentialRefresher {
    async fn refresh(&self) -> DomainResult<String> {
        let mut cached = self.cached.lock().await;

        let stale = match cached.fetched_at {
            None => true,
            Some(at) => at.elapsed() >= self.ttl,
        };

        if stale {
            let fetched = self.fetch().await?;
            cached.slot.replace(Token::Owned(fetched));
            cached.fetched_at = Some(Instant::now());
        }

        Ok(cached
            .slot
            .get()
            .map(Token::as_str)
            .unwrap_or(NO_CREDENTIALS_HELPER_PLACEHOLDER)
            .to_string())
    }
}
