//! Per-folder agent session tracking, expired by age.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub folder: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(folder: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            session_id: session_id.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > max_age
    }
}
