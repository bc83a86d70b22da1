//! `backlog` handler: creates the per-task worktree and branch
//! (spec.md §4.5).

use tokio::fs;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskStatus};
use crate::services::PipelineContext;

use super::common::{branch_name, fail_non_recyclable, worktree_path};

pub async fn run(ctx: &PipelineContext, mut task: Task) -> DomainResult<()> {
    let config = ctx.config_snapshot().await;
    let worktrees_root = std::path::Path::new(&task.repo_path).join(&config.worktrees_dir);
    if let Err(e) = fs::create_dir_all(&worktrees_root).await {
        return fail_non_recyclable(ctx, task, format!("failed to create worktrees dir: {e}")).await;
    }

    if let Err(e) = ctx.git.fetch(&task.repo_path, "origin").await {
        return fail_non_recyclable(ctx, task, format!("fetch failed: {e}")).await;
    }

    let path = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    let path_str = path.to_string_lossy().to_string();
    let branch = branch_name(task.id);

    // Proactively clear any stale state from a prior crashed attempt.
    let _ = ctx.git.worktree_remove(&task.repo_path, &path_str).await;
    let _ = ctx.git.worktree_prune(&task.repo_path).await;
    let _ = ctx.git.branch_delete(&task.repo_path, &branch).await;

    match ctx.git.worktree_add(&task.repo_path, &path_str, &branch, "origin/main").await {
        Ok(out) if out.success => {
            task.branch = branch;
            task.transition(TaskStatus::Spec);
            ctx.store.tasks.update(&task).await?;
            info!(task_id = task.id, branch = %task.branch, "worktree created");
            Ok(())
        }
        Ok(out) => fail_non_recyclable(ctx, task, format!("worktree add failed: {}", out.stderr)).await,
        Err(e) => {
            warn!(task_id = task.id, error = %e, "worktree_add errored");
            fail_non_recyclable(ctx, task, format!("worktree add errored: {e}")).await
        }
    }
}
