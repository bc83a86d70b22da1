//! Worktree & session garbage collector (SPEC_FULL.md §4.9, supplementing
//! spec.md): periodically reclaims the git worktree and session transcript
//! directory of any task that has been terminal (`merged`/`failed`) longer
//! than the retention window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::services::phases::{session_dir, worktree_path};
use crate::services::PipelineContext;

/// How long a terminal task's worktree/session survives before reclaim.
const RETENTION: ChronoDuration = ChronoDuration::hours(24);

pub async fn run(ctx: PipelineContext, running: Arc<AtomicBool>) {
    loop {
        let tick_s = ctx.config_snapshot().await.pipeline_tick_s.max(1);
        tokio::time::sleep(Duration::from_secs(tick_s * 30)).await;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if let Err(e) = sweep(&ctx).await {
            warn!(error = %e, "worktree gc sweep failed");
        }
    }
}

async fn sweep(ctx: &PipelineContext) -> DomainResult<()> {
    let cutoff = Utc::now() - RETENTION;
    let tasks = ctx.store.tasks.list_terminal_before(cutoff).await?;
    if tasks.is_empty() {
        return Ok(());
    }

    let config = ctx.config_snapshot().await;
    let mut reclaimed = 0usize;
    for task in &tasks {
        let wt = worktree_path(&config.worktrees_dir, &task.repo_path, task.id);
        let wt_str = wt.to_string_lossy().to_string();
        let removed_by_git = ctx
            .git
            .worktree_remove(&task.repo_path, &wt_str)
            .await
            .map(|o| o.success)
            .unwrap_or(false);
        if !removed_by_git {
            // `git worktree remove` fails once the metadata is already gone;
            // the directory itself may still be left over.
            let _ = tokio::fs::remove_dir_all(&wt).await;
        }

        let sessions = session_dir(&config.sessions_dir, task.id);
        let _ = tokio::fs::remove_dir_all(&sessions).await;
        reclaimed += 1;
    }

    info!(reclaimed, "worktree gc sweep reclaimed stale task worktrees/sessions");

    let expired = ctx.store.sessions.expire_older_than(RETENTION).await?;
    if expired > 0 {
        info!(expired, "worktree gc expired stale session records");
    }

    Ok(())
}
