//! Code-host PR state vocabulary, parsed once per query (spec.md §9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    Merged,
    Unknown,
    Mergeable,
    Conflicting,
    Other(String),
}

impl PrState {
    pub fn from_mergeable_field(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            "UNKNOWN" => Self::Unknown,
            "MERGEABLE" => Self::Mergeable,
            "CONFLICTING" => Self::Conflicting,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn from_state_field(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            other => Self::Other(other.to_string()),
        }
    }
}
