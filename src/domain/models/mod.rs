//! Core domain models (spec.md §3).

mod agent;
mod chat_agent_run;
mod config;
mod event;
mod generic_state;
mod phase_output;
mod pr_state;
mod proposal;
mod queue_entry;
mod session;
mod task;

pub use agent::{AgentMessage, AgentOutcome, AgentRequest, AgentStreamFold, Persona};
pub use chat_agent_run::{ChatAgentRun, ChatAgentRunStatus};
pub use config::{Config, DatabaseConfig, LogConfig, LogFormat, RepoConfig, SettingsPatch};
pub use event::{Event, EventLevel, MAX_EVENTS};
pub use generic_state::{
    KEY_BACKLOG_IMPORTED_PREFIX, KEY_FORCE_RESTART, KEY_INTEGRATION_LAST_RUN, KEY_SEED_LAST_FIRE, KEY_SEED_MODE,
    KEY_SELF_UPDATE_ARMED_AT, KEY_SELF_UPDATE_STARTUP_HEAD, KEY_UPDATE_READY,
};
pub use phase_output::{Phase, PhaseOutput, STREAM_OUTPUT_MAX_BYTES, TRUNCATED_OUTPUT_MAX_BYTES};
pub use pr_state::PrState;
pub use proposal::{Proposal, ProposalStatus, Triage};
pub use queue_entry::{QueueEntry, QueueStatus, MAX_UNKNOWN_RETRIES};
pub use session::Session;
pub use task::{Task, TaskCreator, TaskStatus, LAST_ERROR_MAX_BYTES};
