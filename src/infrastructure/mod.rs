//! Ambient infrastructure: configuration loading and structured logging.
//! Neither module is part of the orchestration kernel's domain logic; both
//! are the "carried regardless of Non-goals" ambient stack SPEC_FULL.md §1
//! calls for.

pub mod config;
pub mod logging;
