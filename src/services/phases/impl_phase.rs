//! `impl` / `retry` handler: Worker agent implements the change, then the
//! repo's test command gates the transition (spec.md §4.3, §4.5).

use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Persona, Phase, PhaseOutput, Task, TaskStatus};
use crate::services::PipelineContext;

use super::common::{fail_non_recyclable, invoke_agent, recycle, route_after_test_failure, run_repo_command, session_dir, worktree_path};

pub async fn run(ctx: &PipelineContext, mut task: Task) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    let Some(repo) = config.repo(&task.repo_path).cloned() else {
        return fail_non_recyclable(ctx, task, "repo not found in configuration").await;
    };

    let workdir = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    let workdir_str = workdir.to_string_lossy().to_string();
    let sessions = session_dir(&config.sessions_dir, task.id);

    // Idempotency short-circuit: the previous attempt may already have left
    // a passing worktree (e.g. after a crash between test pass and commit
    // bookkeeping).
    let precheck = run_repo_command(&repo.test_command, &workdir).await?;
    if precheck.success {
        let has_diff = ctx.git.diff_has_changes(&task.repo_path, "origin/main").await.unwrap_or(true);
        if has_diff {
            let branch = task.branch.clone();
            let repo_path = task.repo_path.clone();
            return finish_done(ctx, task, &branch, &repo_path).await;
        }
        task.transition(TaskStatus::Merged);
        ctx.store.tasks.update(&task).await?;
        info!(task_id = task.id, "impl precheck passed with no diff, already merged");
        return Ok(());
    }

    let prompt = if task.status == TaskStatus::Retry {
        format!(
            "Task #{}: {}\n\nThe previous implementation attempt failed:\n{}\n\nFix the implementation so the tests pass.",
            task.id,
            task.title,
            task.last_error.clone().unwrap_or_default()
        )
    } else {
        format!(
            "Task #{}: {}\n\n{}\n\nImplement the change described in spec.md so the tests pass.",
            task.id, task.title, task.description
        )
    };

    let outcome = match invoke_agent(
        ctx,
        &config,
        &repo,
        Persona::Worker,
        prompt,
        &workdir,
        &sessions,
        task.resume_session_id.clone(),
        false,
    )
    .await
    {
        Ok(o) => o,
        Err(e) => return fail_non_recyclable(ctx, task, format!("worker agent failed: {e}")).await,
    };
    task.resume_session_id = outcome.session_id.clone();

    ctx.git.add_all(&workdir_str).await?;
    let commit = ctx.git.commit(&workdir_str, &format!("Worker: implement task #{} (attempt {})", task.id, task.attempt_count + 1)).await?;
    if !commit.success || commit.stdout.contains("nothing to commit") {
        return fail_non_recyclable(ctx, task, "worker agent produced no changes to commit").await;
    }

    let diff = ctx.git.diff_text(&workdir_str, "origin/main").await.unwrap_or_default();
    let phase = if task.status == TaskStatus::Retry { Phase::Retry } else { Phase::Impl };
    ctx.store
        .phase_outputs
        .append(&PhaseOutput::new(task.id, phase, &diff, &outcome.raw_stream, Some(outcome.exit_code)))
        .await?;

    let test_result = run_repo_command(&repo.test_command, &workdir).await?;
    ctx.store
        .phase_outputs
        .append(&PhaseOutput::new(
            task.id,
            phase,
            &format!("stdout:\n{}\nstderr:\n{}", test_result.stdout, test_result.stderr),
            "",
            test_result.exit_code,
        ))
        .await?;

    if test_result.success {
        let branch = task.branch.clone();
        let repo_path = task.repo_path.clone();
        return finish_done(ctx, task, &branch, &repo_path).await;
    }

    task.attempt_count += 1;
    task.set_last_error(format!("test command failed:\n{}\n{}", test_result.stdout, test_result.stderr));
    if task.is_exhausted() {
        let err = task.last_error.clone().unwrap_or_default();
        return recycle(ctx, task, err).await;
    }

    let next = route_after_test_failure(task.attempt_count, &format!("{}\n{}", test_result.stdout, test_result.stderr));
    if next == TaskStatus::QaFix {
        task.resume_session_id = None;
    }
    task.transition(next);
    ctx.store.tasks.update(&task).await?;
    info!(task_id = task.id, next = next.as_str(), "impl test failure routed");
    Ok(())
}

async fn finish_done(ctx: &PipelineContext, mut task: Task, branch: &str, repo_path: &str) -> DomainResult<()> {
    task.transition(TaskStatus::Done);
    ctx.store.tasks.update(&task).await?;
    ctx.store.queue.enqueue(task.id, branch, repo_path).await?;
    info!(task_id = task.id, "impl/retry complete, enqueued for integration");
    Ok(())
}
