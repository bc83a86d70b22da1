//! Shared helpers used by every phase handler: worktree/session paths,
//! attempt bookkeeping, and the qa_fix-vs-retry routing rule (spec.md §4.3,
//! §4.5).

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::adapters::substrates::claude_code::compose_system_prompt;
use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentOutcome, Config, Event, EventLevel, Persona, RepoConfig, Task, TaskStatus, STREAM_OUTPUT_MAX_BYTES};
use crate::domain::ports::AgentSpawn;
use crate::services::PipelineContext;

/// Refreshes credentials, composes the persona system prompt, and spawns one
/// agent turn (spec.md §4.5 "Agent invocation contract"). `host = true`
/// selects the unsandboxed invocation used only by `rebase`.
#[allow(clippy::too_many_arguments)]
pub async fn invoke_agent(
    ctx: &PipelineContext,
    config: &Config,
    repo: &RepoConfig,
    persona: Persona,
    prompt: String,
    workdir: &Path,
    session_dir: &Path,
    resume_session_id: Option<String>,
    host: bool,
) -> DomainResult<AgentOutcome> {
    ctx.credentials.refresh().await?;
    let config_suffix = format!("You operate as the '{}' assistant.", config.assistant_name);
    let system_prompt = compose_system_prompt(persona, &config_suffix, repo.prompt_suffix.as_deref());
    let spawn = AgentSpawn {
        persona,
        prompt,
        system_prompt,
        model: config.model.clone(),
        workdir,
        session_dir,
        resume_session_id,
        timeout: agent_timeout(config),
        container_memory_mb: config.container_memory_mb,
    };
    if host {
        ctx.substrate.run_host(spawn).await
    } else {
        ctx.substrate.run_sandboxed(spawn).await
    }
}

/// Result of running a repo-configured command (test/build) in a worktree.
pub struct CommandOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

fn truncate(s: String, max: usize) -> String {
    if s.len() <= max {
        s
    } else {
        let mut s = s;
        s.truncate(max);
        s
    }
}

/// Run `argv` with `cwd` as the working directory; stdout/stderr are bounded
/// to `STREAM_OUTPUT_MAX_BYTES` each (spec.md §4.5 "Outputs ≤8 KB per
/// stream").
pub async fn run_repo_command(argv: &[String], cwd: &Path) -> DomainResult<CommandOutcome> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(CommandOutcome {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
        });
    };
    let output = Command::new(program).args(args).current_dir(cwd).output().await?;
    Ok(CommandOutcome {
        success: output.status.success(),
        stdout: truncate(String::from_utf8_lossy(&output.stdout).into_owned(), STREAM_OUTPUT_MAX_BYTES),
        stderr: truncate(String::from_utf8_lossy(&output.stderr).into_owned(), STREAM_OUTPUT_MAX_BYTES),
        exit_code: output.status.code(),
    })
}

pub fn worktree_path(worktrees_dir: &str, repo_path: &str, task_id: i64) -> PathBuf {
    PathBuf::from(repo_path).join(worktrees_dir).join(format!("task-{task_id}"))
}

pub fn branch_name(task_id: i64) -> String {
    format!("task-{task_id}")
}

pub fn session_dir(sessions_dir: &str, task_id: i64) -> PathBuf {
    PathBuf::from(sessions_dir).join(format!("task-{task_id}"))
}

/// Persist `task`, log a `pipeline` event, and notify the task's channel.
/// Every non-silent failure reaches this path (spec.md §7).
pub async fn notify_failure(ctx: &PipelineContext, task: &Task, summary: &str) {
    ctx.notifier.notify(&task.notify_channel, summary).await;
    ctx.store
        .events
        .log_event(
            Event::new(EventLevel::Warn, "pipeline", summary.to_string())
                .with_task(task.id)
                .with_meta("status", task.status.as_str()),
        )
        .await;
}

/// Non-recyclable phase failure (setup_branch/spec/qa/qa_fix): increment
/// attempt; terminal `failed` on exhaustion, otherwise the task stays in its
/// current status so the scheduler simply re-runs the same handler.
pub async fn fail_non_recyclable(ctx: &PipelineContext, mut task: Task, err: impl Into<String>) -> DomainResult<()> {
    let message = err.into();
    task.attempt_count += 1;
    task.set_last_error(message.clone());
    if task.is_exhausted() {
        task.transition(TaskStatus::Failed);
    } else {
        task.updated_at = chrono::Utc::now();
    }
    ctx.store.tasks.update(&task).await?;
    warn!(task_id = task.id, status = task.status.as_str(), %message, "phase failed");
    notify_failure(ctx, &task, &format!("task #{} failed: {message}", task.id)).await;
    Ok(())
}

/// Recyclable phase failure (impl/retry/rebase exhaustion): clear worktree
/// before recycling to backlog so a later `setup_branch` starts clean.
pub async fn recycle(ctx: &PipelineContext, mut task: Task, err: impl Into<String>) -> DomainResult<()> {
    let message = err.into();
    let config = ctx.config_snapshot().await;
    let path = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
    if let Err(e) = ctx.git.worktree_remove(&task.repo_path, &path.to_string_lossy()).await {
        warn!(task_id = task.id, error = %e, "worktree_remove failed during recycle");
    }
    task.set_last_error(message.clone());
    task.recycle();
    ctx.store.tasks.update(&task).await?;
    info!(task_id = task.id, %message, "task recycled to backlog");
    notify_failure(ctx, &task, &format!("task #{} recycled after exhausting attempts: {message}", task.id)).await;
    Ok(())
}

/// Marker patterns identifying a test-authored fault rather than an
/// implementation bug (spec.md §4.3 qa_fix-vs-retry rule).
pub fn looks_like_test_fault(test_output: &str) -> bool {
    let lower = test_output.to_lowercase();
    for line in lower.lines() {
        let is_compile_error_line = line.contains("error");
        if is_compile_error_line && (line.contains("_test.") || line.contains("/tests/")) {
            return true;
        }
    }
    lower.contains("segmentation fault") || (lower.contains("panicked") && lower.contains("tests/"))
}

/// Decide the next status for an impl/retry phase test failure: second or
/// later failure with test-fault markers routes to `qa_fix`, otherwise
/// `retry` (spec.md §4.3).
pub fn route_after_test_failure(attempt_count: u32, test_output: &str) -> TaskStatus {
    if attempt_count >= 2 && looks_like_test_fault(test_output) {
        TaskStatus::QaFix
    } else {
        TaskStatus::Retry
    }
}

pub fn agent_timeout(config: &crate::domain::models::Config) -> Duration {
    Duration::from_secs(config.agent_timeout_s)
}

/// Force-push `branch`, applying the "cannot lock ref" remediation (delete
/// the remote branch and re-push once) shared by the integration engine's
/// push step and the rebase handler's post-verify push (spec.md §4.4.4c,
/// §4.5).
pub async fn force_push_with_remediation(
    ctx: &PipelineContext,
    repo_path: &str,
    branch: &str,
) -> DomainResult<crate::domain::ports::GitOutput> {
    let first = ctx.git.push(repo_path, branch, true).await?;
    if first.success || !first.stderr.contains(crate::domain::ports::signals::CANNOT_LOCK_REF) {
        return Ok(first);
    }
    warn!(repo_path, branch, "cannot lock ref, deleting remote branch and re-pushing");
    let _ = ctx.git.push_delete(repo_path, branch).await;
    ctx.git.push(repo_path, branch, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_markers_detected() {
        assert!(looks_like_test_fault("error[E0425]: cannot find value in foo_test.rs"));
        assert!(looks_like_test_fault("error: mismatched types at /tests/helpers.rs:10"));
        assert!(looks_like_test_fault("thread panicked at tests/api.rs:5: assertion failed"));
        assert!(looks_like_test_fault("Segmentation fault (core dumped)"));
        assert!(!looks_like_test_fault("error[E0425]: cannot find value in src/lib.rs"));
    }

    #[test]
    fn routing_requires_second_failure() {
        assert_eq!(route_after_test_failure(1, "error in foo_test.rs"), TaskStatus::Retry);
        assert_eq!(route_after_test_failure(2, "error in foo_test.rs"), TaskStatus::QaFix);
        assert_eq!(route_after_test_failure(2, "error in src/lib.rs"), TaskStatus::Retry);
    }
}
