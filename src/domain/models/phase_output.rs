//! Immutable record of a single phase execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Truncated output stored for quick operator inspection.
pub const TRUNCATED_OUTPUT_MAX_BYTES: usize = 32 * 1024;

/// Bound applied per-stream when persisting impl/retry/rebase test output.
pub const STREAM_OUTPUT_MAX_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SetupBranch,
    Spec,
    Qa,
    QaFix,
    Impl,
    Retry,
    Rebase,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetupBranch => "setup_branch",
            Self::Spec => "spec",
            Self::Qa => "qa",
            Self::QaFix => "qa_fix",
            Self::Impl => "impl",
            Self::Retry => "retry",
            Self::Rebase => "rebase",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "setup_branch" => Self::SetupBranch,
            "spec" => Self::Spec,
            "qa" => Self::Qa,
            "qa_fix" => Self::QaFix,
            "impl" => Self::Impl,
            "retry" => Self::Retry,
            "rebase" => Self::Rebase,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutput {
    pub id: i64,
    pub task_id: i64,
    pub phase: Phase,
    pub output: String,
    pub raw_stream: String,
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
}

fn truncate_to(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s[..max].to_string()
    }
}

impl PhaseOutput {
    pub fn new(task_id: i64, phase: Phase, output: &str, raw_stream: &str, exit_code: Option<i32>) -> Self {
        Self {
            id: 0,
            task_id,
            phase,
            output: truncate_to(output, TRUNCATED_OUTPUT_MAX_BYTES),
            raw_stream: raw_stream.to_string(),
            exit_code,
            created_at: Utc::now(),
        }
    }
}
