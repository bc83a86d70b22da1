//! Exercises `GitCli` against a real on-disk repo (spec.md §6), including the
//! worktree add/remove round trip the worktree GC sweep depends on.

mod common;

use foreman::adapters::git::GitCli;
use foreman::domain::ports::Git;

#[tokio::test]
async fn rev_parse_head_succeeds_on_a_fresh_repo() {
    let (_dir, repo) = common::setup_test_git_repo();
    let git = GitCli::new();

    let out = git.rev_parse(repo.to_str().unwrap(), "HEAD").await.unwrap();
    assert!(out.success);
    assert!(!out.stdout.trim().is_empty());
}

#[tokio::test]
async fn is_ancestor_true_for_head_against_itself() {
    let (_dir, repo) = common::setup_test_git_repo();
    let git = GitCli::new();

    let ancestor = git.is_ancestor(repo.to_str().unwrap(), "HEAD", "HEAD").await.unwrap();
    assert!(ancestor);
}

#[tokio::test]
async fn worktree_add_then_remove_round_trips() {
    let (dir, repo) = common::setup_test_git_repo();
    let git = GitCli::new();
    let repo_str = repo.to_str().unwrap();

    let wt_path = dir.path().join("wt-1");
    let wt_str = wt_path.to_str().unwrap();

    let added = git.worktree_add(repo_str, wt_str, "task-1", "HEAD").await.unwrap();
    assert!(added.success, "worktree add failed: {}", added.stderr);
    assert!(wt_path.exists());

    let removed = git.worktree_remove(repo_str, wt_str).await.unwrap();
    assert!(removed.success, "worktree remove failed: {}", removed.stderr);
    assert!(!wt_path.exists());
}

#[tokio::test]
async fn diff_has_changes_reflects_an_uncommitted_edit() {
    let (dir, repo) = common::setup_test_git_repo();
    let git = GitCli::new();
    let repo_str = repo.to_str().unwrap();

    assert!(!git.diff_has_changes(repo_str, "HEAD").await.unwrap());

    std::fs::write(dir.path().join("new_file.txt"), "content").unwrap();
    git.add_all(repo_str).await.unwrap();
    assert!(git.diff_has_changes(repo_str, "HEAD").await.unwrap());
}
