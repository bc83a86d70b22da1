//! Typed runtime configuration, mapped onto every operator-tunable named in
//! spec.md §6 plus the ambient database/logging/repo settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".foreman/pipeline.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub log_dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

/// A repository the supervisor drives tasks against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub path: String,
    /// The primary repo is the one the supervisor itself lives in: eligible
    /// for self-update, and the target for cross-pollinated proposals.
    #[serde(default)]
    pub primary: bool,
    /// Manual-merge mode: ready queue entries stop at `pending_review`.
    #[serde(default)]
    pub manual_merge: bool,
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
    pub prompt_suffix: Option<String>,
}

fn default_test_command() -> Vec<String> {
    vec!["cargo".into(), "test".into()]
}

fn default_build_command() -> Vec<String> {
    vec!["cargo".into(), "build".into()]
}

/// The fixed allow-list of settings mutable via `PUT /settings`
/// (spec.md §6). Each field is independently persisted to `generic_state`
/// and applied to the live configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub continuous_mode: bool,
    pub release_interval_mins: u64,
    pub pipeline_max_backlog: usize,
    pub agent_timeout_s: u64,
    pub pipeline_seed_cooldown_s: u64,
    pub pipeline_tick_s: u64,
    pub model: String,
    pub container_memory_mb: u64,
    pub assistant_name: String,
    pub pipeline_max_agents: usize,

    /// How often the self-update supervisor checks the primary repo's
    /// `origin/main` for new commits (spec.md §4.7). Not in the `PUT
    /// /settings` allow-list (spec.md §6); configurable only via
    /// `.foreman/config.yaml`/env.
    #[serde(default = "default_remote_check_interval_s")]
    pub remote_check_interval_s: u64,

    pub database: DatabaseConfig,
    pub logging: LogConfig,
    pub repos: Vec<RepoConfig>,

    /// Root directory for per-task persistent session transcripts
    /// (`<sessions_dir>/task-<id>`, spec.md §4.9).
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: String,

    /// Root directory under which per-task git worktrees are created
    /// (`<worktrees_dir>/task-<id>`).
    #[serde(default = "default_worktrees_dir")]
    pub worktrees_dir: String,

    /// Known generated-artifact paths the cleanup PR step may remove once
    /// backlog work is drained (spec.md §4.4.7, generalized per SPEC_FULL).
    #[serde(default = "default_cleanup_artifacts")]
    pub cleanup_artifacts: Vec<String>,

    /// argv invoked to mint a fresh OAuth token ahead of each agent
    /// invocation; empty runs without credential refresh. The helper's
    /// concrete mechanism is out of scope (spec.md §9).
    #[serde(default)]
    pub credential_helper_command: Vec<String>,

    /// Prefix sandbox containers are named with; swept (force-killed) at
    /// supervisor startup to clean up after a crash (spec.md §4.2).
    #[serde(default = "default_container_name_prefix")]
    pub container_name_prefix: String,
}

fn default_cleanup_artifacts() -> Vec<String> {
    vec![".backlog_import_complete".to_string()]
}

fn default_sessions_dir() -> String {
    ".foreman/sessions".to_string()
}

fn default_worktrees_dir() -> String {
    ".foreman/worktrees".to_string()
}

fn default_remote_check_interval_s() -> u64 {
    300
}

fn default_container_name_prefix() -> String {
    "foreman-agent-".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            continuous_mode: false,
            release_interval_mins: 30,
            pipeline_max_backlog: 20,
            agent_timeout_s: 1800,
            pipeline_seed_cooldown_s: 1800,
            pipeline_tick_s: 10,
            model: "sonnet".to_string(),
            container_memory_mb: 4096,
            assistant_name: "foreman".to_string(),
            pipeline_max_agents: 3,
            remote_check_interval_s: default_remote_check_interval_s(),
            database: DatabaseConfig::default(),
            logging: LogConfig::default(),
            repos: Vec::new(),
            sessions_dir: default_sessions_dir(),
            worktrees_dir: default_worktrees_dir(),
            cleanup_artifacts: default_cleanup_artifacts(),
            credential_helper_command: Vec::new(),
            container_name_prefix: default_container_name_prefix(),
        }
    }
}

impl Config {
    pub fn primary_repo(&self) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.primary)
    }

    pub fn repo(&self, path: &str) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.path == path)
    }

    /// Idle cooldown before the seed engine fires: hard-coded 1800s in
    /// continuous mode, operator-configurable otherwise (spec.md §4.6, §9).
    pub fn seed_cooldown_s(&self) -> u64 {
        if self.continuous_mode {
            1800
        } else {
            self.pipeline_seed_cooldown_s
        }
    }
}

/// Patch applied by the `PUT /settings` control-surface contract. Every
/// field mirrors an allow-listed `Config` field; `None` leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub continuous_mode: Option<bool>,
    pub release_interval_mins: Option<u64>,
    pub pipeline_max_backlog: Option<usize>,
    pub agent_timeout_s: Option<u64>,
    pub pipeline_seed_cooldown_s: Option<u64>,
    pub pipeline_tick_s: Option<u64>,
    pub model: Option<String>,
    pub container_memory_mb: Option<u64>,
    pub assistant_name: Option<String>,
    pub pipeline_max_agents: Option<usize>,
}

impl SettingsPatch {
    /// Apply this patch to `config`, returning the (key, value) pairs that
    /// actually changed so the caller can persist + audit-log each one.
    pub fn apply(&self, config: &mut Config) -> Vec<(&'static str, String)> {
        let mut changed = Vec::new();
        macro_rules! apply_field {
            ($field:ident, $key:literal) => {
                if let Some(v) = &self.$field {
                    if format!("{:?}", v) != format!("{:?}", &config.$field) {
                        changed.push(($key, format!("{:?}", v)));
                    }
                    config.$field = v.clone();
                }
            };
        }
        apply_field!(continuous_mode, "continuous_mode");
        apply_field!(release_interval_mins, "release_interval_mins");
        apply_field!(pipeline_max_backlog, "pipeline_max_backlog");
        apply_field!(agent_timeout_s, "agent_timeout_s");
        apply_field!(pipeline_seed_cooldown_s, "pipeline_seed_cooldown_s");
        apply_field!(pipeline_tick_s, "pipeline_tick_s");
        apply_field!(model, "model");
        apply_field!(container_memory_mb, "container_memory_mb");
        apply_field!(assistant_name, "assistant_name");
        apply_field!(pipeline_max_agents, "pipeline_max_agents");
        changed
    }
}
