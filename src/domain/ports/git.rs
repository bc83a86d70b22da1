//! Git port (spec.md §6): every invocation takes an explicit working
//! directory and argv; no hidden global state.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait Git: Send + Sync {
    async fn fetch(&self, repo: &str, remote: &str) -> DomainResult<GitOutput>;
    async fn pull(&self, repo: &str, branch: &str) -> DomainResult<GitOutput>;
    async fn checkout(&self, repo: &str, branch: &str) -> DomainResult<GitOutput>;
    async fn rev_parse(&self, repo: &str, rev: &str) -> DomainResult<GitOutput>;
    async fn is_ancestor(&self, repo: &str, ancestor: &str, descendant: &str) -> DomainResult<bool>;
    async fn branch_delete(&self, repo: &str, branch: &str) -> DomainResult<GitOutput>;
    async fn diff_has_changes(&self, repo: &str, against: &str) -> DomainResult<bool>;
    async fn add_all(&self, repo: &str) -> DomainResult<GitOutput>;
    async fn commit(&self, repo: &str, message: &str) -> DomainResult<GitOutput>;
    async fn push(&self, repo: &str, branch: &str, force: bool) -> DomainResult<GitOutput>;
    async fn push_delete(&self, repo: &str, branch: &str) -> DomainResult<GitOutput>;
    async fn rebase_onto(&self, repo: &str, onto: &str) -> DomainResult<GitOutput>;
    async fn rebase_abort(&self, repo: &str) -> DomainResult<GitOutput>;

    /// Text of `git diff <against>`, used to persist `PhaseOutput` content
    /// for the qa/qa_fix/impl phases (spec.md §4.5).
    async fn diff_text(&self, repo: &str, against: &str) -> DomainResult<String>;

    async fn worktree_add(&self, repo: &str, path: &str, branch: &str, base: &str) -> DomainResult<GitOutput>;
    async fn worktree_remove(&self, repo: &str, path: &str) -> DomainResult<GitOutput>;
    async fn worktree_prune(&self, repo: &str) -> DomainResult<GitOutput>;

    /// Bounded (≤4KB) `ls-files` listing used as spec-phase context.
    async fn ls_files_bounded(&self, repo: &str, max_bytes: usize) -> DomainResult<String>;
}

/// Known protocol-signal substrings matched in Git/code-host stderr
/// (spec.md §6).
pub mod signals {
    pub const CANNOT_LOCK_REF: &str = "cannot lock ref";
    pub const NO_COMMITS_BETWEEN: &str = "No commits between";
    pub const NOT_MERGEABLE: &str = "not mergeable";
    pub const CANNOT_BE_CLEANLY_CREATED: &str = "cannot be cleanly created";
    pub const EVERYTHING_UP_TO_DATE: &str = "Everything up-to-date";
    pub const SEGFAULT: &str = "segmentation fault";
}
