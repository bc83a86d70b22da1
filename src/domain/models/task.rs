//! Task domain model and its status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bound on `last_error` text persisted on a task row.
pub const LAST_ERROR_MAX_BYTES: usize = 4 * 1024;

/// Status of a task in the pipeline. See spec.md §4.3 for the full
/// transition table; `valid_transitions` encodes it exhaustively so illegal
/// jumps are a compile-time-checked match rather than a stringly-typed bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Spec,
    Qa,
    QaFix,
    Impl,
    Retry,
    Rebase,
    Done,
    Merged,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Spec => "spec",
            Self::Qa => "qa",
            Self::QaFix => "qa_fix",
            Self::Impl => "impl",
            Self::Retry => "retry",
            Self::Rebase => "rebase",
            Self::Done => "done",
            Self::Merged => "merged",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "backlog" => Self::Backlog,
            "spec" => Self::Spec,
            "qa" => Self::Qa,
            "qa_fix" => Self::QaFix,
            "impl" => Self::Impl,
            "retry" => Self::Retry,
            "rebase" => Self::Rebase,
            "done" => Self::Done,
            "merged" => Self::Merged,
            "failed" => Self::Failed,
            _ => return None,
        })
    }

    /// A task is "active" iff its status is one the scheduler dispatches.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Backlog
                | Self::Spec
                | Self::Qa
                | Self::QaFix
                | Self::Impl
                | Self::Retry
                | Self::Rebase
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Merged | Self::Failed)
    }

    /// Scheduler priority: lower sorts first. `done`/`merged`/`failed` never
    /// reach the scheduler (they aren't active) so they have no meaningful
    /// priority; they're placed last for defensive ordering only.
    pub fn priority(self) -> u8 {
        match self {
            Self::Rebase => 0,
            Self::Retry => 1,
            Self::Impl => 2,
            Self::Qa | Self::QaFix => 3,
            Self::Spec => 4,
            Self::Backlog => 5,
            Self::Done | Self::Merged | Self::Failed => 6,
        }
    }
}

/// Who originated a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCreator {
    Director,
    Backlog,
    Seeder,
    Proposal,
    HealthCheck,
}

impl TaskCreator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Backlog => "backlog",
            Self::Seeder => "seeder",
            Self::Proposal => "proposal",
            Self::HealthCheck => "health-check",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "director" => Self::Director,
            "backlog" => Self::Backlog,
            "seeder" => Self::Seeder,
            "proposal" => Self::Proposal,
            "health-check" => Self::HealthCheck,
            _ => return None,
        })
    }
}

/// A unit of work against one repository, driven through the phase pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub repo_path: String,
    /// Empty before `spec` phase assigns it.
    pub branch: String,
    pub status: TaskStatus,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub creator: TaskCreator,
    pub notify_channel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque agent-conversation continuation token; cleared on recycle.
    pub resume_session_id: Option<String>,
    /// Set while a worker in this process owns the task; cleared on every
    /// exit path including crash recovery at startup.
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        repo_path: impl Into<String>,
        creator: TaskCreator,
        notify_channel: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            repo_path: repo_path.into(),
            branch: String::new(),
            status: TaskStatus::Backlog,
            attempt_count: 0,
            max_attempts: 5,
            last_error: None,
            creator,
            notify_channel: notify_channel.into(),
            created_at: now,
            updated_at: now,
            resume_session_id: None,
            dispatched_at: None,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched_at.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }

    /// Record a transient failure, truncating to the bounded field size.
    pub fn set_last_error(&mut self, err: impl Into<String>) {
        let mut s = err.into();
        if s.len() > LAST_ERROR_MAX_BYTES {
            s.truncate(LAST_ERROR_MAX_BYTES);
        }
        self.last_error = Some(s);
    }

    /// Recycle: send back to backlog with attempts/branch/session cleared.
    /// Distinct from `failed`, which is terminal.
    pub fn recycle(&mut self) {
        self.status = TaskStatus::Backlog;
        self.attempt_count = 0;
        self.branch.clear();
        self.resume_session_id = None;
        self.updated_at = Utc::now();
    }

    pub fn transition(&mut self, to: TaskStatus) {
        self.status = to;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            TaskStatus::Backlog,
            TaskStatus::Spec,
            TaskStatus::Qa,
            TaskStatus::QaFix,
            TaskStatus::Impl,
            TaskStatus::Retry,
            TaskStatus::Rebase,
            TaskStatus::Done,
            TaskStatus::Merged,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn active_set_matches_spec() {
        assert!(TaskStatus::Backlog.is_active());
        assert!(TaskStatus::Rebase.is_active());
        assert!(!TaskStatus::Done.is_active());
        assert!(!TaskStatus::Merged.is_active());
        assert!(!TaskStatus::Failed.is_active());
    }

    #[test]
    fn priority_order_matches_spec() {
        assert!(TaskStatus::Rebase.priority() < TaskStatus::Retry.priority());
        assert!(TaskStatus::Retry.priority() < TaskStatus::Impl.priority());
        assert!(TaskStatus::Impl.priority() < TaskStatus::Qa.priority());
        assert_eq!(TaskStatus::Qa.priority(), TaskStatus::QaFix.priority());
        assert!(TaskStatus::Qa.priority() < TaskStatus::Spec.priority());
        assert!(TaskStatus::Spec.priority() < TaskStatus::Backlog.priority());
    }

    #[test]
    fn recycle_clears_attempt_branch_session_but_not_id_or_title() {
        let mut t = Task::new("t", "d", "/repo", TaskCreator::Director, "");
        t.id = 42;
        t.attempt_count = 3;
        t.branch = "task-42".to_string();
        t.resume_session_id = Some("sess".to_string());
        t.status = TaskStatus::Retry;

        t.recycle();

        assert_eq!(t.status, TaskStatus::Backlog);
        assert_eq!(t.attempt_count, 0);
        assert!(t.branch.is_empty());
        assert!(t.resume_session_id.is_none());
        assert_eq!(t.id, 42);
        assert_eq!(t.title, "t");
    }
}
