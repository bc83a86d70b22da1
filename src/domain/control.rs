//! Contract types for the control surface (spec.md §6).
//!
//! The HTTP/JSON server itself is out of scope for the core; these are the
//! request/response shapes the core must honor regardless of which
//! transport an operator dashboard speaks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub repo: String,
    /// `director` unless a creator is explicitly supplied.
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCreated {
    pub task_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusSummary {
    pub active_tasks: i64,
    pub queued_integrations: i64,
    pub in_flight_agents: usize,
    pub max_agents: usize,
}
