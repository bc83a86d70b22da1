//! Agent substrate port: spawns a persona-driven agent and returns its
//! parsed NDJSON outcome (spec.md §4.5 "Agent invocation contract").

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentOutcome, Persona};

/// Everything a phase handler needs to spawn one agent turn.
pub struct AgentSpawn<'a> {
    pub persona: Persona,
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
    pub workdir: &'a Path,
    pub session_dir: &'a Path,
    pub resume_session_id: Option<String>,
    pub timeout: Duration,
    pub container_memory_mb: u64,
}

#[async_trait]
pub trait Substrate: Send + Sync {
    /// Sandboxed invocation: binds `workdir`/`session_dir` into a container
    /// with a memory cap, writes the request to stdin, folds NDJSON from
    /// stdout with a watchdog that force-kills the container on timeout.
    async fn run_sandboxed(&self, spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome>;

    /// Host-side invocation: same contract, runs on the supervisor host.
    /// Used only for `rebase`, which must mutate the outer Git repository.
    /// Host agents never inherit a sandboxed session id.
    async fn run_host(&self, spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome>;

    /// Forcibly terminates any lingering sandbox containers left behind by a
    /// prior crashed process, matched by `name_prefix` (spec.md §4.2 "Crash
    /// recovery"). Default is a no-op; substrates that launch containers
    /// override it.
    async fn sweep_stale_containers(&self, _name_prefix: &str) -> DomainResult<()> {
        Ok(())
    }
}
