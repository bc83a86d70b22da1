//! Code-host CLI port (spec.md §6): `view`, `create`, `merge` against a PR.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::PrState;

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub success: bool,
    /// True when stderr indicated a conflict rather than a transient error.
    pub conflict: bool,
    pub stderr: String,
}

/// Result of `create_pr`, distinguishing "created, number known" from
/// "created, number couldn't be parsed from stdout" from "not created
/// because the branch already has no commits to merge" — these must not be
/// collapsed into one `Option`, since the latter means "already merged" and
/// the middle one does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePrOutcome {
    /// PR created; number parsed from the `gh pr create` stdout URL.
    Created(i64),
    /// PR created successfully but stdout didn't parse into a PR number.
    /// The caller should fall back to a `pr_number` query, not assume merged.
    CreatedUnknownNumber,
    /// stderr matched "No commits between" — the branch is already merged
    /// into base, not newly opened.
    AlreadyMerged,
}

#[async_trait]
pub trait CodeHost: Send + Sync {
    /// `view --json state`. `None` if no PR exists yet.
    async fn pr_state(&self, repo_path: &str, branch: &str) -> DomainResult<Option<PrState>>;

    /// `view --json number`. `None` if no PR exists yet.
    async fn pr_number(&self, repo_path: &str, branch: &str) -> DomainResult<Option<i64>>;

    /// `view --json mergeable`.
    async fn pr_mergeable(&self, repo_path: &str, branch: &str) -> DomainResult<PrState>;

    /// `create --base main --head <branch> --title "<t>" --body "..."`.
    async fn create_pr(&self, repo_path: &str, branch: &str, title: &str, body: &str) -> DomainResult<CreatePrOutcome>;

    /// `merge --squash --delete-branch`.
    async fn merge_pr(&self, repo_path: &str, branch: &str) -> DomainResult<MergeOutcome>;
}
