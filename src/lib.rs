//! foreman: an autonomous software-engineering pipeline supervisor
//! (spec.md §1). The domain layer defines tasks, phases, and ports; adapters
//! implement those ports against git/GitHub/Claude Code; services hold the
//! scheduler, phase handlers, integration engine, seed engine, and the
//! ambient self-update/health-monitor/worktree-gc loops; infrastructure
//! carries config loading and logging.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::sqlite::Store;
pub use domain::models::Config;
pub use services::PipelineContext;
