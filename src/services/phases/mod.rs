//! Per-status phase handlers (spec.md §4.5). `dispatch` is the single entry
//! point the scheduler's worker calls; each handler owns the task value for
//! the duration of the call and persists every outcome before returning.

mod common;
mod impl_phase;
mod qa;
mod rebase;
mod setup_branch;
mod spec;

pub use common::{force_push_with_remediation, invoke_agent, run_repo_command, session_dir, worktree_path};

use tracing::{error, info_span, Instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskStatus};
use crate::services::PipelineContext;

pub async fn dispatch(ctx: &PipelineContext, task: Task) -> DomainResult<()> {
    let status = task.status;
    let task_id = task.id;
    let span = info_span!("phase", phase = status.as_str(), task_id);
    let result = async {
        match status {
            TaskStatus::Backlog => setup_branch::run(ctx, task).await,
            TaskStatus::Spec => spec::run(ctx, task).await,
            TaskStatus::Qa => qa::run(ctx, task, false).await,
            TaskStatus::QaFix => qa::run(ctx, task, true).await,
            TaskStatus::Impl | TaskStatus::Retry => impl_phase::run(ctx, task).await,
            TaskStatus::Rebase => rebase::run(ctx, task).await,
            TaskStatus::Done | TaskStatus::Merged | TaskStatus::Failed => Ok(()),
        }
    }
    .instrument(span)
    .await;

    if let Err(ref e) = result {
        error!(task_id, phase = status.as_str(), error = %e, "phase handler returned an error");
    }
    result
}
