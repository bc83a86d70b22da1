//! Structured log record persisted alongside `tracing` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Events beyond this count are pruned oldest-first after every insert.
pub const MAX_EVENTS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub level: EventLevel,
    pub category: String,
    pub message: String,
    pub metadata: HashMap<String, String>,
}

impl Event {
    pub fn new(level: EventLevel, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            level,
            category: category.into(),
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_task(mut self, task_id: i64) -> Self {
        self.metadata.insert("task_id".to_string(), task_id.to_string());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
