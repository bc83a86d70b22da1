//! Git CLI adapter: every operation is an explicit argv run in an explicit
//! working directory (spec.md §6).

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{Git, GitOutput};

#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, repo: &str, args: &[&str]) -> DomainResult<GitOutput> {
        let output = Command::new("git").arg("-C").arg(repo).args(args).output().await?;
        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Git for GitCli {
    async fn fetch(&self, repo: &str, remote: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["fetch", remote]).await
    }

    async fn pull(&self, repo: &str, branch: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["pull", "origin", branch]).await
    }

    async fn checkout(&self, repo: &str, branch: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["checkout", branch]).await
    }

    async fn rev_parse(&self, repo: &str, rev: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["rev-parse", rev]).await
    }

    async fn is_ancestor(&self, repo: &str, ancestor: &str, descendant: &str) -> DomainResult<bool> {
        let out = self.run(repo, &["merge-base", "--is-ancestor", ancestor, descendant]).await?;
        Ok(out.success)
    }

    async fn branch_delete(&self, repo: &str, branch: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["branch", "-D", branch]).await
    }

    async fn diff_has_changes(&self, repo: &str, against: &str) -> DomainResult<bool> {
        let out = self.run(repo, &["diff", "--quiet", against]).await?;
        // `git diff --quiet` exits 1 when there are differences, 0 when clean.
        Ok(!out.success)
    }

    async fn add_all(&self, repo: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["add", "-A"]).await
    }

    async fn commit(&self, repo: &str, message: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["commit", "-m", message]).await
    }

    async fn push(&self, repo: &str, branch: &str, force: bool) -> DomainResult<GitOutput> {
        if force {
            self.run(repo, &["push", "--force", "origin", branch]).await
        } else {
            self.run(repo, &["push", "origin", branch]).await
        }
    }

    async fn push_delete(&self, repo: &str, branch: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["push", "origin", "--delete", branch]).await
    }

    async fn rebase_onto(&self, repo: &str, onto: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["rebase", onto]).await
    }

    async fn rebase_abort(&self, repo: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["rebase", "--abort"]).await
    }

    async fn diff_text(&self, repo: &str, against: &str) -> DomainResult<String> {
        let out = self.run(repo, &["diff", against]).await?;
        Ok(out.stdout)
    }

    async fn worktree_add(&self, repo: &str, path: &str, branch: &str, base: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["worktree", "add", "-b", branch, path, base]).await
    }

    async fn worktree_remove(&self, repo: &str, path: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["worktree", "remove", "--force", path]).await
    }

    async fn worktree_prune(&self, repo: &str) -> DomainResult<GitOutput> {
        self.run(repo, &["worktree", "prune"]).await
    }

    async fn ls_files_bounded(&self, repo: &str, max_bytes: usize) -> DomainResult<String> {
        let out = self.run(repo, &["ls-files"]).await?;
        let mut listing = out.stdout;
        if listing.len() > max_bytes {
            listing.truncate(max_bytes);
        }
        Ok(listing)
    }
}
