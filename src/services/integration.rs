//! Integration Engine (spec.md §4.4): drains each repo's queue in task-id
//! order, reconciles with the code host, and merges.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::models::{
    Config, PrState, QueueEntry, QueueStatus, RepoConfig, Task, TaskStatus, KEY_INTEGRATION_LAST_RUN, MAX_UNKNOWN_RETRIES,
};
use crate::domain::ports::{signals, CreatePrOutcome};
use crate::services::phases::force_push_with_remediation;
use crate::services::{notifier, PipelineContext};

pub async fn run_tick(ctx: &PipelineContext) {
    if !should_run_this_tick(ctx).await {
        return;
    }

    let config = ctx.config_snapshot().await;
    let mut merged_this_tick: Vec<Task> = Vec::new();

    for repo in config.repos.clone() {
        if let Err(e) = run_for_repo(ctx, &repo, &config, &mut merged_this_tick).await {
            warn!(repo = %repo.path, error = %e, "integration engine failed for repo");
        }
    }

    if !merged_this_tick.is_empty() {
        let digest = notifier::format_merge_digest(&merged_this_tick);
        ctx.notifier.notify("integration", &digest).await;
        info!(merged = merged_this_tick.len(), "integration tick complete");
    }
}

async fn should_run_this_tick(ctx: &PipelineContext) -> bool {
    let config = ctx.config_snapshot().await;
    let min_interval_s = if config.continuous_mode {
        60
    } else {
        (config.release_interval_mins * 60).max(60)
    };
    let last = ctx.store.state.get_i64(KEY_INTEGRATION_LAST_RUN, 0).await.unwrap_or(0);
    let now = Utc::now().timestamp();
    if now - last < min_interval_s as i64 {
        return false;
    }
    let _ = ctx.store.state.set(KEY_INTEGRATION_LAST_RUN, &now.to_string()).await;
    true
}

async fn run_for_repo(
    ctx: &PipelineContext,
    repo: &RepoConfig,
    config: &Config,
    merged_out: &mut Vec<Task>,
) -> crate::domain::errors::DomainResult<()> {
    let mut entries = ctx.store.queue.get_queued(&repo.path).await?;
    if entries.is_empty() {
        return Ok(());
    }

    ctx.git.checkout(&repo.path, "main").await?;
    ctx.git.pull(&repo.path, "main").await?;

    entries.sort_by_key(|e| e.task_id);

    let mut fresh_push = std::collections::HashSet::new();
    let mut any_merged = false;

    for entry in &mut entries {
        if !branch_exists(ctx, &repo.path, &entry.branch).await {
            entry.exclude("branch not found");
            ctx.store.queue.update(entry).await?;
            continue;
        }

        if let Some(PrState::Merged) = ctx.code_host.pr_state(&repo.path, &entry.branch).await? {
            finalize_merge(ctx, entry, merged_out, &mut any_merged).await?;
            continue;
        }

        if !ctx.git.is_ancestor(&repo.path, "origin/main", &entry.branch).await.unwrap_or(false) {
            entry.exclude("branch not rebased on main");
            ctx.store.queue.update(entry).await?;
            set_task_status(ctx, entry.task_id, TaskStatus::Rebase).await?;
            continue;
        }

        let push = force_push_with_remediation(ctx, &repo.path, &entry.branch).await?;
        if !push.success && !push.stderr.contains(signals::EVERYTHING_UP_TO_DATE) {
            warn!(task_id = entry.task_id, stderr = %push.stderr, "force-push failed");
            continue;
        }

        if ctx.code_host.pr_number(&repo.path, &entry.branch).await?.is_none() {
            let title = task_title_for_pr(ctx, entry.task_id).await;
            match ctx
                .code_host
                .create_pr(&repo.path, &entry.branch, &title, "Automated implementation by foreman.")
                .await?
            {
                CreatePrOutcome::Created(number) => entry.pr_number = Some(number),
                // Created successfully, but the PR number couldn't be parsed
                // out of stdout: a later `pr_number` query will recover it
                // once GitHub has processed it. Must not be treated as
                // "already merged" — only AlreadyMerged means that.
                CreatePrOutcome::CreatedUnknownNumber => {
                    warn!(task_id = entry.task_id, branch = %entry.branch, "PR created but its number could not be parsed from gh output");
                }
                CreatePrOutcome::AlreadyMerged => {
                    finalize_merge(ctx, entry, merged_out, &mut any_merged).await?;
                    continue;
                }
            }
        }

        fresh_push.insert(entry.id);
        ctx.store.queue.update(entry).await?;
    }

    if repo.manual_merge {
        for entry in &mut entries {
            if entry.status == QueueStatus::Queued {
                entry.status = QueueStatus::PendingReview;
                ctx.store.queue.update(entry).await?;
            }
        }
        return Ok(());
    }

    for entry in &mut entries {
        if entry.status != QueueStatus::Queued || fresh_push.contains(&entry.id) {
            continue;
        }

        if let Some(PrState::Merged) = ctx.code_host.pr_state(&repo.path, &entry.branch).await? {
            finalize_merge(ctx, entry, merged_out, &mut any_merged).await?;
            continue;
        }

        match ctx.code_host.pr_mergeable(&repo.path, &entry.branch).await? {
            PrState::Unknown => {
                entry.unknown_retries += 1;
                if entry.unknown_retries < MAX_UNKNOWN_RETRIES {
                    ctx.store.queue.update(entry).await?;
                    continue;
                }
                entry.unknown_retries = 0;
            }
            PrState::Mergeable => {
                entry.unknown_retries = 0;
            }
            PrState::Merged => {
                finalize_merge(ctx, entry, merged_out, &mut any_merged).await?;
                continue;
            }
            PrState::Conflicting | PrState::Other(_) => {
                entry.exclude("merge conflict with main");
                ctx.store.queue.update(entry).await?;
                set_task_status(ctx, entry.task_id, TaskStatus::Rebase).await?;
                continue;
            }
        }

        entry.status = QueueStatus::Merging;
        ctx.store.queue.update(entry).await?;

        let outcome = ctx.code_host.merge_pr(&repo.path, &entry.branch).await?;
        if outcome.success {
            finalize_merge(ctx, entry, merged_out, &mut any_merged).await?;
        } else if outcome.conflict {
            entry.exclude("merge conflict with main");
            ctx.store.queue.update(entry).await?;
            set_task_status(ctx, entry.task_id, TaskStatus::Rebase).await?;
        } else {
            entry.status = QueueStatus::Queued;
            ctx.store.queue.update(entry).await?;
        }
    }

    if any_merged {
        ctx.git.pull(&repo.path, "main").await.ok();
        maybe_open_cleanup_pr(ctx, repo, config).await;
    }

    Ok(())
}

async fn branch_exists(ctx: &PipelineContext, repo_path: &str, branch: &str) -> bool {
    ctx.git.rev_parse(repo_path, branch).await.map(|o| o.success).unwrap_or(false)
}

async fn task_title_for_pr(ctx: &PipelineContext, task_id: i64) -> String {
    match ctx.store.tasks.get(task_id).await {
        Ok(Some(task)) => task.title,
        _ => format!("task #{task_id}"),
    }
}

async fn set_task_status(ctx: &PipelineContext, task_id: i64, status: TaskStatus) -> crate::domain::errors::DomainResult<()> {
    if let Some(mut task) = ctx.store.tasks.get(task_id).await? {
        task.transition(status);
        ctx.store.tasks.update(&task).await?;
    }
    Ok(())
}

async fn finalize_merge(
    ctx: &PipelineContext,
    entry: &mut QueueEntry,
    merged_out: &mut Vec<Task>,
    any_merged: &mut bool,
) -> crate::domain::errors::DomainResult<()> {
    entry.status = QueueStatus::Merged;
    ctx.store.queue.update(entry).await?;
    *any_merged = true;

    if let Some(mut task) = ctx.store.tasks.get(entry.task_id).await? {
        task.transition(TaskStatus::Merged);
        ctx.store.tasks.update(&task).await?;
        ctx.notifier.notify(&task.notify_channel, &format!("task #{} merged", task.id)).await;
        merged_out.push(task);
    }
    Ok(())
}

async fn maybe_open_cleanup_pr(ctx: &PipelineContext, repo: &RepoConfig, config: &Config) {
    let backlog_tasks = ctx.store.tasks.list_by_status(TaskStatus::Backlog).await.unwrap_or_default();
    if backlog_tasks.iter().any(|t| t.repo_path == repo.path) {
        return;
    }

    for artifact in &config.cleanup_artifacts {
        let artifact_abs = std::path::Path::new(&repo.path).join(artifact);
        if tokio::fs::metadata(&artifact_abs).await.is_err() {
            continue;
        }
        if let Err(e) = open_cleanup_pr(ctx, repo, artifact).await {
            warn!(repo = %repo.path, artifact, error = %e, "cleanup PR failed");
        }
    }
}

async fn open_cleanup_pr(ctx: &PipelineContext, repo: &RepoConfig, artifact: &str) -> crate::domain::errors::DomainResult<()> {
    let sanitized: String = artifact.chars().map(|c| if c.is_alphanumeric() { c } else { '-' }).collect();
    let branch = format!("cleanup-{sanitized}");
    let temp_path = std::path::Path::new(&repo.path).join(".worktrees").join(format!("cleanup-{sanitized}"));
    let temp_str = temp_path.to_string_lossy().to_string();

    ctx.git.worktree_add(&repo.path, &temp_str, &branch, "origin/main").await?;
    tokio::fs::remove_file(temp_path.join(artifact)).await.ok();
    ctx.git.add_all(&temp_str).await?;
    let commit = ctx.git.commit(&temp_str, &format!("Remove stale artifact {artifact}")).await?;
    if commit.success {
        ctx.git.push(&repo.path, &branch, false).await?;
        ctx.code_host
            .create_pr(&repo.path, &branch, &format!("Clean up {artifact}"), "Automated cleanup: this generated artifact is no longer needed.")
            .await?;
    }
    ctx.git.worktree_remove(&repo.path, &temp_str).await?;
    Ok(())
}
