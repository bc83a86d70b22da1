//! Self-Update Supervisor (spec.md §4.7): watches the primary repo's
//! `origin/main`, rebuilds on a new commit, and arms a graceful restart once
//! the build succeeds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{KEY_FORCE_RESTART, KEY_SELF_UPDATE_ARMED_AT, KEY_SELF_UPDATE_STARTUP_HEAD, KEY_UPDATE_READY};
use crate::services::phases::run_repo_command;
use crate::services::PipelineContext;

/// How long an armed restart waits before firing unconditionally
/// (spec.md §4.7: "wait 3h or restart immediately on force-restart").
const RESTART_WAIT_S: i64 = 3 * 60 * 60;

pub async fn run(ctx: PipelineContext, running: Arc<AtomicBool>) {
    if let Err(e) = record_startup_head(&ctx).await {
        warn!(error = %e, "failed to record self-update startup HEAD");
    }

    loop {
        let interval = ctx.config_snapshot().await.remote_check_interval_s.max(1);
        tokio::time::sleep(Duration::from_secs(interval)).await;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match tick(&ctx).await {
            Ok(true) => {
                info!("self-update restart armed and due, stopping supervisor loop");
                running.store(false, Ordering::SeqCst);
                let _ = ctx.store.state.set(KEY_UPDATE_READY, "1").await;
                let _ = ctx.store.state.set(KEY_FORCE_RESTART, "0").await;
                let _ = ctx.store.state.set(KEY_SELF_UPDATE_ARMED_AT, "").await;
                break;
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "self-update tick failed"),
        }
    }
}

async fn record_startup_head(ctx: &PipelineContext) -> DomainResult<()> {
    let Some(primary) = ctx.config_snapshot().await.primary_repo().cloned() else {
        return Ok(());
    };
    if let Some(head) = current_head(ctx, &primary.path).await? {
        ctx.store.state.set(KEY_SELF_UPDATE_STARTUP_HEAD, &head).await?;
    }
    Ok(())
}

async fn current_head(ctx: &PipelineContext, repo_path: &str) -> DomainResult<Option<String>> {
    let out = ctx.git.rev_parse(repo_path, "HEAD").await?;
    Ok(out.success.then(|| out.stdout.trim().to_string()))
}

/// `git fetch` touches the network; retry with backoff rather than treating
/// one transient failure as "no update available".
async fn fetch_with_retry(ctx: &PipelineContext, repo_path: &str) -> DomainResult<()> {
    let policy = backoff::ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::from_secs(30))).build();
    backoff::future::retry(policy, || async {
        ctx.git.fetch(repo_path, "origin").await.map_err(|e| {
            warn!(repo_path, error = %e, "self-update fetch failed, retrying");
            backoff::Error::transient(e)
        })
    })
    .await?;
    Ok(())
}

/// Returns `true` when a restart should fire this tick.
async fn tick(ctx: &PipelineContext) -> DomainResult<bool> {
    let config = ctx.config_snapshot().await;
    let Some(primary) = config.primary_repo().cloned() else {
        return Ok(false);
    };

    if let Some(armed_at) = ctx.store.state.get(KEY_SELF_UPDATE_ARMED_AT).await?.filter(|s| !s.is_empty()) {
        return should_fire(ctx, &armed_at).await;
    }

    fetch_with_retry(ctx, &primary.path).await?;
    let local = ctx.git.rev_parse(&primary.path, "main").await?;
    let origin = ctx.git.rev_parse(&primary.path, "origin/main").await?;
    if !local.success || !origin.success || local.stdout.trim() == origin.stdout.trim() {
        return Ok(false);
    }

    ctx.git.checkout(&primary.path, "main").await?;
    ctx.git.pull(&primary.path, "main").await?;

    let new_head = current_head(ctx, &primary.path).await?.unwrap_or_default();
    let startup_head = ctx.store.state.get(KEY_SELF_UPDATE_STARTUP_HEAD).await?.unwrap_or_default();
    if new_head == startup_head {
        return Ok(false);
    }

    let build = run_repo_command(&primary.build_command, std::path::Path::new(&primary.path)).await?;
    if !build.success {
        warn!(stderr = %build.stderr, "self-update build failed, not arming restart");
        return Ok(false);
    }

    let armed_at = Utc::now().timestamp().to_string();
    ctx.store.state.set(KEY_SELF_UPDATE_ARMED_AT, &armed_at).await?;
    info!("self-update build succeeded on new commit, restart armed");
    should_fire(ctx, &armed_at).await
}

async fn should_fire(ctx: &PipelineContext, armed_at: &str) -> DomainResult<bool> {
    if ctx.store.state.get(KEY_FORCE_RESTART).await?.as_deref() == Some("1") {
        return Ok(true);
    }
    let armed: i64 = armed_at.parse().unwrap_or(0);
    Ok(Utc::now().timestamp() - armed >= RESTART_WAIT_S)
}
