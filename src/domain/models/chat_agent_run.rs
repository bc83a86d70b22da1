//! Correlates a chat-triggered agent invocation with its eventual reply.
//!
//! Out of scope for the SE pipeline core except for the startup reset rule:
//! every `running` row is abandoned on supervisor boot (a run that was
//! in-flight when the process died has no one left to deliver its reply).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAgentRunStatus {
    Running,
    Completed,
    Failed,
    Delivered,
    Abandoned,
}

impl ChatAgentRunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "delivered" => Self::Delivered,
            "abandoned" => Self::Abandoned,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAgentRun {
    pub id: i64,
    pub folder: String,
    pub status: ChatAgentRunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
