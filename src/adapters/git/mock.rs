//! In-memory `Git` double for service-layer tests: returns scripted/default
//! success outcomes instead of shelling out to a real `git` binary.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{Git, GitOutput};

fn ok(stdout: impl Into<String>) -> GitOutput {
    GitOutput {
        success: true,
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn err(stderr: impl Into<String>) -> GitOutput {
    GitOutput {
        success: false,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

/// Scripted behavior a test case wants to force for one `(repo, branch)`
/// pair; anything not scripted falls back to the default "everything
/// succeeds, every branch is an ancestor of main" behavior.
#[derive(Default)]
struct Scripts {
    is_ancestor: HashMap<String, bool>,
    diff_has_changes: HashMap<String, bool>,
    push_fails_with: HashMap<String, String>,
}

pub struct MockGit {
    scripts: Mutex<Scripts>,
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGit {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(Scripts::default()),
        }
    }

    /// Forces the next `is_ancestor` check whose first argument (`repo`) is
    /// `repo_or_workdir` to return `value` instead of the default `true`.
    /// Both call shapes in this crate (integration's `(repo_path, "origin/main",
    /// branch)` and rebase's `(workdir, "origin/main", "HEAD")`) pass a
    /// stable first argument per task, so keying on it is sufficient.
    pub async fn set_is_ancestor(&self, repo_or_workdir: &str, value: bool) {
        self.scripts.lock().await.is_ancestor.insert(repo_or_workdir.to_string(), value);
    }

    pub async fn set_diff_has_changes(&self, repo: &str, value: bool) {
        self.scripts.lock().await.diff_has_changes.insert(repo.to_string(), value);
    }

    /// The next `push` for `branch` fails with `stderr`; subsequent pushes
    /// succeed (mirrors a transient "cannot lock ref" remediated by retry).
    pub async fn fail_next_push(&self, branch: &str, stderr: &str) {
        self.scripts.lock().await.push_fails_with.insert(branch.to_string(), stderr.to_string());
    }

}

#[async_trait]
impl Git for MockGit {
    async fn fetch(&self, _repo: &str, _remote: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn pull(&self, _repo: &str, _branch: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn checkout(&self, _repo: &str, _branch: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn rev_parse(&self, _repo: &str, _rev: &str) -> DomainResult<GitOutput> {
        Ok(ok("deadbeef"))
    }

    async fn is_ancestor(&self, repo: &str, _ancestor: &str, _descendant: &str) -> DomainResult<bool> {
        let scripts = self.scripts.lock().await;
        Ok(*scripts.is_ancestor.get(repo).unwrap_or(&true))
    }

    async fn branch_delete(&self, _repo: &str, _branch: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn diff_has_changes(&self, repo: &str, _against: &str) -> DomainResult<bool> {
        let scripts = self.scripts.lock().await;
        Ok(*scripts.diff_has_changes.get(repo).unwrap_or(&true))
    }

    async fn add_all(&self, _repo: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn commit(&self, _repo: &str, _message: &str) -> DomainResult<GitOutput> {
        Ok(ok("1 file changed"))
    }

    async fn push(&self, _repo: &str, branch: &str, _force: bool) -> DomainResult<GitOutput> {
        let mut scripts = self.scripts.lock().await;
        if let Some(stderr) = scripts.push_fails_with.remove(branch) {
            return Ok(err(stderr));
        }
        Ok(ok(""))
    }

    async fn push_delete(&self, _repo: &str, _branch: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn rebase_onto(&self, _repo: &str, onto: &str) -> DomainResult<GitOutput> {
        Ok(ok(format!("rebased onto {onto}")))
    }

    async fn rebase_abort(&self, _repo: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn diff_text(&self, _repo: &str, _against: &str) -> DomainResult<String> {
        Ok("diff --git a/x b/x\n".to_string())
    }

    async fn worktree_add(&self, _repo: &str, path: &str, _branch: &str, _base: &str) -> DomainResult<GitOutput> {
        // A real `git worktree add` creates the directory; phase handlers
        // immediately run commands inside it, so the double must too.
        let _ = tokio::fs::create_dir_all(path).await;
        Ok(ok(""))
    }

    async fn worktree_remove(&self, _repo: &str, path: &str) -> DomainResult<GitOutput> {
        let _ = tokio::fs::remove_dir_all(path).await;
        Ok(ok(""))
    }

    async fn worktree_prune(&self, _repo: &str) -> DomainResult<GitOutput> {
        Ok(ok(""))
    }

    async fn ls_files_bounded(&self, _repo: &str, _max_bytes: usize) -> DomainResult<String> {
        Ok("src/lib.rs\n".to_string())
    }
}
