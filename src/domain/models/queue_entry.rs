//! Integration queue entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Merging,
    Merged,
    Excluded,
    PendingReview,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Merging => "merging",
            Self::Merged => "merged",
            Self::Excluded => "excluded",
            Self::PendingReview => "pending_review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "queued" => Self::Queued,
            "merging" => Self::Merging,
            "merged" => Self::Merged,
            "excluded" => Self::Excluded,
            "pending_review" => Self::PendingReview,
            _ => return None,
        })
    }
}

/// Maximum number of consecutive `UNKNOWN` mergeability observations before
/// the integration engine proceeds optimistically (spec.md §4.4.6b).
pub const MAX_UNKNOWN_RETRIES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub task_id: i64,
    pub branch: String,
    pub repo_path: String,
    pub status: QueueStatus,
    pub error_message: Option<String>,
    pub unknown_retries: u32,
    pub queued_at: DateTime<Utc>,
    pub pr_number: Option<i64>,
}

impl QueueEntry {
    pub fn new(task_id: i64, branch: impl Into<String>, repo_path: impl Into<String>) -> Self {
        Self {
            id: 0,
            task_id,
            branch: branch.into(),
            repo_path: repo_path.into(),
            status: QueueStatus::Queued,
            error_message: None,
            unknown_retries: 0,
            queued_at: Utc::now(),
            pr_number: None,
        }
    }

    pub fn exclude(&mut self, reason: impl Into<String>) {
        self.status = QueueStatus::Excluded;
        self.error_message = Some(reason.into());
    }
}
