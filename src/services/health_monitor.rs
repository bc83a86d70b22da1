//! Health Monitor (spec.md §4.8): on a fixed 30-minute cadence, pulls and
//! builds/tests each primary-marked repo's `main`, filing a deduped repair
//! task when either step fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{RepoConfig, Task, TaskCreator};
use crate::services::phases::run_repo_command;
use crate::services::PipelineContext;

const CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Tail of stderr embedded in a filed repair task (spec.md §4.8).
const STDERR_TAIL_BYTES: usize = 500;

pub async fn run(ctx: PipelineContext, running: Arc<AtomicBool>) {
    loop {
        tokio::time::sleep(CHECK_INTERVAL).await;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if let Err(e) = check_once(&ctx).await {
            warn!(error = %e, "health monitor pass failed");
        }
    }
}

async fn check_once(ctx: &PipelineContext) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    for repo in config.repos.iter().filter(|r| r.primary) {
        if let Err(e) = check_repo(ctx, repo).await {
            warn!(repo = %repo.path, error = %e, "health check failed to run for repo");
        }
    }
    Ok(())
}

async fn check_repo(ctx: &PipelineContext, repo: &RepoConfig) -> DomainResult<()> {
    ctx.git.checkout(&repo.path, "main").await?;
    ctx.git.pull(&repo.path, "main").await?;

    let workdir = std::path::Path::new(&repo.path);

    let build = run_repo_command(&repo.build_command, workdir).await?;
    if !build.success {
        file_repair_task(ctx, repo, "Fix failing build on main", &build.stderr).await?;
        return Ok(());
    }

    let test = run_repo_command(&repo.test_command, workdir).await?;
    if !test.success {
        file_repair_task(ctx, repo, "Fix failing tests on main", &test.stderr).await?;
    }
    Ok(())
}

async fn file_repair_task(ctx: &PipelineContext, repo: &RepoConfig, title: &str, stderr: &str) -> DomainResult<()> {
    if ctx.store.tasks.find_active_by_title(title).await?.is_some() {
        info!(title, repo = %repo.path, "repair task already active, skipping");
        return Ok(());
    }

    let description = format!(
        "Automated health check failed on `main` in {}.\n\nLast output:\n{}",
        repo.path,
        tail(stderr, STDERR_TAIL_BYTES)
    );
    let task = Task::new(title, description, repo.path.clone(), TaskCreator::HealthCheck, "");
    ctx.store.tasks.create(&task).await?;
    warn!(title, repo = %repo.path, "filed repair task after health check failure");
    Ok(())
}

/// Last `n` bytes of `s`, snapped to the nearest char boundary.
fn tail(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut start = s.len() - n;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_snaps_to_char_boundary() {
        let s = "é".repeat(300);
        let t = tail(&s, 500);
        assert!(t.len() <= s.len());
        assert!(s.ends_with(t));
    }

    #[test]
    fn tail_returns_whole_string_when_shorter_than_limit() {
        assert_eq!(tail("short", 500), "short");
    }
}
