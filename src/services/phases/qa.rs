//! `qa` / `qa_fix` handlers: QA agent writes or rewrites tests
//! (spec.md §4.3, §4.5).

use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Persona, Phase, PhaseOutput, Task, TaskStatus};
use crate::services::PipelineContext;

use super::common::{fail_non_recyclable, invoke_agent, session_dir, worktree_path};

/// `is_fix = true` for `qa_fix`: a fresh session, since the worker agent
/// overwrote the original QA conversation (spec.md §4.3 "Session handling").
pub async fn run(ctx: &PipelineContext, mut task: Task, is_fix: bool) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    let Some(repo) = config.repo(&task.repo_path).cloned() else {
        return fail_non_recyclable(ctx, task, "repo not found in configuration").await;
    };

    let workdir = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    let sessions = session_dir(&config.sessions_dir, task.id);

    let prompt = if is_fix {
        format!(
            "Task #{}: {}\n\nThe tests you previously wrote are implicated in a worker failure: {}\nRewrite the tests so they correctly and unambiguously capture the intended behavior.",
            task.id,
            task.title,
            task.last_error.clone().unwrap_or_default()
        )
    } else {
        format!(
            "Task #{}: {}\n\n{}\n\nWrite or update tests exercising the behavior in spec.md.",
            task.id, task.title, task.description
        )
    };

    let resume = if is_fix { None } else { task.resume_session_id.clone() };

    let persona = Persona::Qa;
    let outcome = match invoke_agent(ctx, &config, &repo, persona, prompt, &workdir, &sessions, resume, false).await {
        Ok(o) => o,
        Err(e) => return fail_non_recyclable(ctx, task, format!("qa agent failed: {e}")).await,
    };

    let commit_message = if is_fix {
        format!("QA fix: rewrite tests for task #{}", task.id)
    } else {
        format!("QA: write tests for task #{}", task.id)
    };
    let workdir_str = workdir.to_string_lossy().to_string();
    ctx.git.add_all(&workdir_str).await?;
    let commit = ctx.git.commit(&workdir_str, &commit_message).await?;
    if !commit.success || commit.stdout.contains("nothing to commit") {
        return fail_non_recyclable(ctx, task, "qa agent produced no changes to commit").await;
    }

    let diff = ctx.git.diff_text(&workdir_str, "origin/main").await.unwrap_or_default();
    let phase = if is_fix { Phase::QaFix } else { Phase::Qa };
    ctx.store
        .phase_outputs
        .append(&PhaseOutput::new(task.id, phase, &diff, &outcome.raw_stream, Some(outcome.exit_code)))
        .await?;

    task.resume_session_id = outcome.session_id;
    task.transition(TaskStatus::Impl);
    ctx.store.tasks.update(&task).await?;
    info!(task_id = task.id, is_fix, "qa phase complete");
    Ok(())
}
