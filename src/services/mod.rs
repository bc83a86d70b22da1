//! Business-logic services: the scheduler, phase engine, integration engine,
//! seed/proposal engine, self-update supervisor, health monitor, worktree
//! garbage collector, and notifier formatting (spec.md §4, SPEC_FULL.md §4).
//!
//! Every service is generic only in the sense that it is constructed with
//! `Arc<dyn Trait>` collaborators bundled in `PipelineContext`; there is no
//! generic-over-repository-type plumbing beyond that, matching the
//! teacher's `services::phase_orchestrator` shape.

pub mod health_monitor;
pub mod integration;
pub mod notifier;
pub mod phases;
pub mod scheduler;
pub mod seed;
pub mod self_update;
pub mod settings;
pub mod worktree_gc;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::adapters::sqlite::Store;
use crate::domain::models::Config;
use crate::domain::ports::{CodeHost, CredentialRefresher, Git, Notifier, Substrate};

/// Shared collaborators every service needs. Cloned cheaply (every field is
/// an `Arc` or a `Clone`-cheap handle); held by the scheduler and passed by
/// reference into phase/integration/seed functions.
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Store,
    pub git: Arc<dyn Git>,
    pub code_host: Arc<dyn CodeHost>,
    pub substrate: Arc<dyn Substrate>,
    pub credentials: Arc<dyn CredentialRefresher>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<RwLock<Config>>,
    /// Atomic in-flight worker counter; every increment on dispatch is
    /// paired with a decrement on every worker exit path (spec.md §4.2, §5).
    pub in_flight: Arc<AtomicUsize>,
}

impl PipelineContext {
    pub async fn config_snapshot(&self) -> Config {
        self.config.read().await.clone()
    }
}
