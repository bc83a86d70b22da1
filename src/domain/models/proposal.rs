//! Human-approval-gated suggestion generated by the seed engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Proposed,
    Approved,
    Dismissed,
    AutoDismissed,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Dismissed => "dismissed",
            Self::AutoDismissed => "auto_dismissed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "proposed" => Self::Proposed,
            "approved" => Self::Approved,
            "dismissed" => Self::Dismissed,
            "auto_dismissed" => Self::AutoDismissed,
            _ => return None,
        })
    }
}

/// 1-5 triage dimensions plus a composite 1-10 score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Triage {
    pub impact: Option<u8>,
    pub feasibility: Option<u8>,
    pub risk: Option<u8>,
    pub effort: Option<u8>,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub repo_path: String,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub status: ProposalStatus,
    pub triage: Triage,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        repo_path: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            repo_path: repo_path.into(),
            title: title.into(),
            description: description.into(),
            rationale: rationale.into(),
            status: ProposalStatus::Proposed,
            triage: Triage::default(),
            reasoning: None,
            created_at: Utc::now(),
        }
    }

    /// A dismiss-flagged triage (duplicate, already-merged, vague,
    /// irrelevant) auto-dismisses rather than waiting for human review.
    pub fn apply_triage(&mut self, triage: Triage, reasoning: impl Into<String>, dismiss: bool) {
        self.triage = triage;
        self.reasoning = Some(reasoning.into());
        if dismiss {
            self.status = ProposalStatus::AutoDismissed;
        }
    }
}
