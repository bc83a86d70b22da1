//! Key/value string store: counters, schema version, one-shot flags,
//! and settings overrides (spec.md §3 `GenericState`).

/// Key under which the rotating seed-mode counter is persisted.
pub const KEY_SEED_MODE: &str = "seed_mode";

/// Key prefix for "backlog imported for repo X" one-shot flags.
pub const KEY_BACKLOG_IMPORTED_PREFIX: &str = "backlog_imported:";

/// Unix timestamp of the last integration engine tick that actually ran
/// (spec.md §4.4 "every tick subject to a minimum 60s interval").
pub const KEY_INTEGRATION_LAST_RUN: &str = "integration_last_run_unix";

/// Unix timestamp of the HEAD commit recorded at supervisor startup
/// (spec.md §4.7 Self-Update Supervisor).
pub const KEY_SELF_UPDATE_STARTUP_HEAD: &str = "self_update_startup_head";

/// Unix timestamp a successful self-update build armed a restart at
/// (spec.md §4.7 "wait 3h or force-restart").
pub const KEY_SELF_UPDATE_ARMED_AT: &str = "self_update_armed_at";

/// Operator-settable force-restart flag consumed by the self-update
/// supervisor (spec.md §6 `POST /release`).
pub const KEY_FORCE_RESTART: &str = "force_restart";

/// Flag the process launcher observes to re-exec after a self-update
/// restart (spec.md §4.7).
pub const KEY_UPDATE_READY: &str = "update_ready";

/// Unix timestamp of the last idle firing of the seed engine
/// (spec.md §4.6 cooldown).
pub const KEY_SEED_LAST_FIRE: &str = "seed_last_fire_unix";
