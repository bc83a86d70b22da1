//! `rebase` handler: fetches, rebases the task branch onto `origin/main`,
//! runs a host-side Worker agent on conflict, then re-verifies and re-tests
//! before re-enqueueing (spec.md §4.5).

use tokio::fs;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Persona, Phase, PhaseOutput, Task, TaskStatus};
use crate::services::PipelineContext;

use super::common::{fail_non_recyclable, force_push_with_remediation, invoke_agent, recycle, run_repo_command, session_dir, worktree_path};

pub async fn run(ctx: &PipelineContext, mut task: Task) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    let Some(repo) = config.repo(&task.repo_path).cloned() else {
        return fail_non_recyclable(ctx, task, "repo not found in configuration").await;
    };

    let workdir = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    let workdir_str = workdir.to_string_lossy().to_string();
    let sessions = session_dir(&config.sessions_dir, task.id);

    repair_worktree_if_corrupted(&workdir).await;

    if let Err(e) = ctx.git.fetch(&task.repo_path, "origin").await {
        return fail_non_recyclable(ctx, task, format!("fetch failed: {e}")).await;
    }

    let rebase_result = ctx.git.rebase_onto(&workdir_str, "origin/main").await?;
    if !rebase_result.success {
        warn!(task_id = task.id, "rebase conflict, aborting and invoking worker agent host-side");
        ctx.git.rebase_abort(&workdir_str).await.ok();

        let prompt = format!(
            "Task #{}: {}\n\nRebasing branch '{}' onto origin/main produced conflicts:\n{}\n\nResolve the conflicts and complete the rebase.",
            task.id, task.title, task.branch, rebase_result.stderr
        );
        let outcome = match invoke_agent(ctx, &config, &repo, Persona::Worker, prompt, &workdir, &sessions, None, true).await {
            Ok(o) => o,
            Err(e) => return fail_non_recyclable(ctx, task, format!("rebase worker agent failed: {e}")).await,
        };
        ctx.store
            .phase_outputs
            .append(&PhaseOutput::new(task.id, Phase::Rebase, &outcome.output, &outcome.raw_stream, Some(outcome.exit_code)))
            .await?;
    }

    let rebased = ctx.git.is_ancestor(&workdir_str, "origin/main", "HEAD").await.unwrap_or(false);
    if !rebased {
        task.attempt_count += 1;
        task.set_last_error("origin/main is not an ancestor of branch HEAD after rebase attempt");
        if task.is_exhausted() {
            let err = task.last_error.clone().unwrap_or_default();
            return recycle(ctx, task, err).await;
        }
        ctx.store.tasks.update(&task).await?;
        info!(task_id = task.id, attempt = task.attempt_count, "rebase not verified, retrying within rebase");
        return Ok(());
    }

    let test_result = run_repo_command(&repo.test_command, &workdir).await?;
    if !test_result.success {
        task.attempt_count += 1;
        task.set_last_error(format!("post-rebase tests failed:\n{}\n{}", test_result.stdout, test_result.stderr));
        if task.is_exhausted() {
            let err = task.last_error.clone().unwrap_or_default();
            return recycle(ctx, task, err).await;
        }
        ctx.store.tasks.update(&task).await?;
        info!(task_id = task.id, attempt = task.attempt_count, "post-rebase tests failed, retrying within rebase");
        return Ok(());
    }

    let push = force_push_with_remediation(ctx, &task.repo_path, &task.branch).await?;
    if !push.success {
        return fail_non_recyclable(ctx, task, format!("post-rebase push failed: {}", push.stderr)).await;
    }

    task.transition(TaskStatus::Done);
    ctx.store.tasks.update(&task).await?;
    ctx.store.queue.enqueue(task.id, &task.branch, &task.repo_path).await?;
    info!(task_id = task.id, "rebase complete, re-enqueued for integration");
    Ok(())
}

/// A worktree's `.git` is normally a file pointing at the real gitdir; if a
/// prior crash left it as a directory, the worktree is unusable and must be
/// removed so `setup_branch` recreates it on the next backlog pass.
async fn repair_worktree_if_corrupted(workdir: &std::path::Path) {
    let git_pointer = workdir.join(".git");
    if let Ok(meta) = fs::metadata(&git_pointer).await {
        if meta.is_dir() {
            warn!(path = %workdir.display(), "worktree .git corrupted into a directory, removing");
            let _ = fs::remove_dir_all(workdir).await;
        }
    }
}
