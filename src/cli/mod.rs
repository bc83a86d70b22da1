//! Operator CLI (spec.md §6 control surface): a local, single-process
//! stand-in for the out-of-scope HTTP transport, operating directly against
//! the `Store` the running supervisor also uses.

pub mod commands;
mod types;

pub use types::{Cli, Commands, ProposalCommands, QueueCommands, SettingsCommands, TaskCommands};
