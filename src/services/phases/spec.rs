//! `spec` handler: Manager agent writes `spec.md` (spec.md §4.5).

use tokio::fs;
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Persona, Phase, PhaseOutput, Task, TaskStatus};
use crate::services::PipelineContext;

use super::common::{fail_non_recyclable, invoke_agent, session_dir, worktree_path};

pub async fn run(ctx: &PipelineContext, mut task: Task) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    let Some(repo) = config.repo(&task.repo_path).cloned() else {
        return fail_non_recyclable(ctx, task, "repo not found in configuration").await;
    };

    let workdir = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    let sessions = session_dir(&config.sessions_dir, task.id);

    let listing = ctx.git.ls_files_bounded(&workdir.to_string_lossy(), 4 * 1024).await.unwrap_or_default();
    let prompt = format!(
        "Task #{}: {}\n\n{}\n\nFiles in the worktree:\n{listing}",
        task.id, task.title, task.description
    );

    let outcome = match invoke_agent(ctx, &config, &repo, Persona::Manager, prompt, &workdir, &sessions, None, false).await {
        Ok(o) => o,
        Err(e) => return fail_non_recyclable(ctx, task, format!("manager agent failed: {e}")).await,
    };

    let spec_path = workdir.join("spec.md");
    let spec_contents = fs::read_to_string(&spec_path).await.ok();

    if spec_contents.is_none() && outcome.output.trim().is_empty() {
        return fail_non_recyclable(ctx, task, "manager agent produced no spec.md and no output").await;
    }

    let artifact = spec_contents.clone().unwrap_or_else(|| outcome.output.clone());
    ctx.store
        .phase_outputs
        .append(&PhaseOutput::new(task.id, Phase::Spec, &artifact, &outcome.raw_stream, Some(outcome.exit_code)))
        .await?;

    task.resume_session_id = outcome.session_id;
    task.transition(TaskStatus::Qa);
    ctx.store.tasks.update(&task).await?;
    info!(task_id = task.id, "spec phase complete");
    Ok(())
}
