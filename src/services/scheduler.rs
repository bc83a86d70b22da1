//! Task Scheduler (spec.md §4.2): a tick loop that selects active tasks by
//! priority, enforces the `max_agents` concurrency cap, and hands each
//! dispatched task to its own worker task with scoped acquisition/release of
//! the in-flight counter and the persisted dispatched flag.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::domain::models::Task;
use crate::services::{integration, phases, seed, PipelineContext};

/// At most this many active tasks are considered per tick (spec.md §4.2).
const MAX_TASKS_PER_TICK: usize = 20;

/// Bound on the graceful-shutdown drain wait (spec.md §4.2, §5).
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Guards the in-flight counter: decrements on every exit path, including a
/// panicking worker, because `Drop` still runs during stack unwinding.
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs the scheduler loop until `running` is cleared, ticking every
/// `pipeline_tick_s` seconds. Also drives the integration engine and the
/// idle-triggered seed engine from the same loop, matching the single
/// supervisor-loop-thread design of spec.md §5.
pub async fn run(ctx: PipelineContext, running: Arc<AtomicBool>) {
    loop {
        {
            let mut config = ctx.config.write().await;
            if let Err(e) = crate::services::settings::refresh(&*ctx.store.state, &mut config).await {
                warn!(error = %e, "failed to refresh persisted settings");
            }
        }
        let tick_s = ctx.config_snapshot().await.pipeline_tick_s.max(1);
        tokio::time::sleep(Duration::from_secs(tick_s)).await;

        if !running.load(Ordering::SeqCst) {
            break;
        }

        if let Err(e) = tick(&ctx).await {
            error!(error = %e, "scheduler tick failed");
        }
    }

    info!("scheduler stopping, waiting for in-flight workers to drain");
    let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
    while ctx.in_flight.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    if ctx.in_flight.load(Ordering::SeqCst) > 0 {
        warn!(in_flight = ctx.in_flight.load(Ordering::SeqCst), "shutdown grace period elapsed with workers still running");
    }
}

async fn tick(ctx: &PipelineContext) -> crate::domain::errors::DomainResult<()> {
    let candidates = ctx.store.tasks.get_next_active(MAX_TASKS_PER_TICK).await?;
    let cap = ctx.config_snapshot().await.pipeline_max_agents;

    for task in candidates {
        if ctx.in_flight.load(Ordering::SeqCst) >= cap {
            break;
        }
        if ctx.store.tasks.is_dispatched(task.id).await? {
            continue;
        }
        dispatch_worker(ctx, task).await?;
    }

    integration::run_tick(ctx).await;
    seed::maybe_run(ctx).await;

    Ok(())
}

async fn dispatch_worker(ctx: &PipelineContext, task: Task) -> crate::domain::errors::DomainResult<()> {
    let task_id = task.id;
    ctx.store.tasks.mark_dispatched(task_id).await?;

    let worker_ctx = ctx.clone();
    // Acquired synchronously, before `tokio::spawn`, so the next tick's cap
    // check (line 81) observes this worker's increment immediately rather
    // than racing the spawned task's own startup.
    let guard = InFlightGuard::acquire(worker_ctx.in_flight.clone());
    tokio::spawn(async move {
        let _guard = guard;

        let outcome = AssertUnwindSafe(phases::dispatch(&worker_ctx, task)).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(task_id, error = %e, "worker phase dispatch returned an error"),
            Err(_) => error!(task_id, "worker phase dispatch panicked"),
        }

        if let Err(e) = worker_ctx.store.tasks.clear_dispatched(task_id).await {
            error!(task_id, error = %e, "failed to clear dispatched flag after worker exit");
        }
    });

    Ok(())
}
