//! Event (structured log) repository port.
//!
//! `log_event` must never surface an error to the caller: event logging is
//! best-effort observability, not a correctness dependency (spec.md §4.1,
//! §7).

use async_trait::async_trait;

use crate::domain::models::Event;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert `event`, then prune so at most `MAX_EVENTS` rows remain.
    /// Failures are logged via `tracing` and otherwise swallowed.
    async fn log_event(&self, event: Event);

    async fn recent(&self, limit: i64) -> Vec<Event>;
}
