//! GitHub CLI (`gh`) code-host adapter.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tokio::process::Command;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PrState;
use crate::domain::ports::{signals, CodeHost, CreatePrOutcome, MergeOutcome};

type GhRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Caps outbound `gh` invocations so a backlog of queue entries doesn't
/// hammer the GitHub API (spec.md §6 "code-host query throttling").
const QUERIES_PER_SECOND: u32 = 2;

#[derive(Clone)]
pub struct GhCli {
    limiter: Arc<GhRateLimiter>,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct StateJson {
    state: String,
}

#[derive(Debug, Deserialize)]
struct NumberJson {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct MergeableJson {
    mergeable: String,
}

impl GhCli {
    pub fn new() -> Self {
        let quota = Quota::per_second(NonZeroU32::new(QUERIES_PER_SECOND).expect("QUERIES_PER_SECOND is nonzero"));
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    async fn view(&self, repo_path: &str, branch: &str, json_fields: &str) -> DomainResult<Option<String>> {
        self.limiter.until_ready().await;
        let output = Command::new("gh")
            .current_dir(repo_path)
            .args(["pr", "view", branch, "--json", json_fields])
            .output()
            .await
            .map_err(|e| DomainError::CodeHost(format!("gh pr view spawn failed: {e}")))?;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

#[async_trait]
impl CodeHost for GhCli {
    async fn pr_state(&self, repo_path: &str, branch: &str) -> DomainResult<Option<PrState>> {
        let Some(body) = self.view(repo_path, branch, "state").await? else {
            return Ok(None);
        };
        let parsed: StateJson = serde_json::from_str(&body)
            .map_err(|e| DomainError::CodeHost(format!("unparseable gh pr view state: {e}")))?;
        Ok(Some(PrState::from_state_field(&parsed.state)))
    }

    async fn pr_number(&self, repo_path: &str, branch: &str) -> DomainResult<Option<i64>> {
        let Some(body) = self.view(repo_path, branch, "number").await? else {
            return Ok(None);
        };
        let parsed: NumberJson = serde_json::from_str(&body)
            .map_err(|e| DomainError::CodeHost(format!("unparseable gh pr view number: {e}")))?;
        Ok(Some(parsed.number))
    }

    async fn pr_mergeable(&self, repo_path: &str, branch: &str) -> DomainResult<PrState> {
        let Some(body) = self.view(repo_path, branch, "mergeable").await? else {
            return Ok(PrState::Unknown);
        };
        let parsed: MergeableJson = serde_json::from_str(&body)
            .map_err(|e| DomainError::CodeHost(format!("unparseable gh pr view mergeable: {e}")))?;
        Ok(PrState::from_mergeable_field(&parsed.mergeable))
    }

    async fn create_pr(&self, repo_path: &str, branch: &str, title: &str, body: &str) -> DomainResult<CreatePrOutcome> {
        let sanitized_title: String = title.chars().filter(|c| c.is_alphanumeric() || " -_:/.".contains(*c)).collect();

        self.limiter.until_ready().await;
        let output = Command::new("gh")
            .current_dir(repo_path)
            .args(["pr", "create", "--base", "main", "--head", branch, "--title", &sanitized_title, "--body", body])
            .output()
            .await
            .map_err(|e| DomainError::CodeHost(format!("gh pr create spawn failed: {e}")))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let number = stdout.trim().rsplit('/').next().and_then(|s| s.parse::<i64>().ok());
            return Ok(match number {
                Some(n) => CreatePrOutcome::Created(n),
                None => CreatePrOutcome::CreatedUnknownNumber,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(signals::NO_COMMITS_BETWEEN) {
            return Ok(CreatePrOutcome::AlreadyMerged);
        }
        Err(DomainError::CodeHost(format!("gh pr create failed: {stderr}")))
    }

    async fn merge_pr(&self, repo_path: &str, branch: &str) -> DomainResult<MergeOutcome> {
        self.limiter.until_ready().await;
        let output = Command::new("gh")
            .current_dir(repo_path)
            .args(["pr", "merge", branch, "--squash", "--delete-branch"])
            .output()
            .await
            .map_err(|e| DomainError::CodeHost(format!("gh pr merge spawn failed: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let conflict = stderr.contains(signals::NOT_MERGEABLE) || stderr.contains(signals::CANNOT_BE_CLEANLY_CREATED);

        Ok(MergeOutcome {
            success: output.status.success(),
            conflict,
            stderr,
        })
    }
}
