//! Hierarchical config loader (spec.md §6, SPEC_FULL.md §6 "Configuration
//! file contract"): defaults → `.foreman/config.yaml` → `.foreman/local.yaml`
//! → `FOREMAN_*` environment variables, highest precedence last.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[source] figment::Error),

    #[error("pipeline_max_agents must be at least 1")]
    ZeroMaxAgents,

    #[error("pipeline_tick_s must be at least 1")]
    ZeroTickInterval,

    #[error("agent_timeout_s must be at least 1")]
    ZeroAgentTimeout,

    #[error("database path cannot be empty")]
    EmptyDatabasePath,

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("repo '{0}' appears more than once in configuration")]
    DuplicateRepo(String),

    #[error("more than one repo is marked primary")]
    MultiplePrimaryRepos,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `Config`, merging project config over programmatic defaults and
    /// environment variables over both. Always project-local (cwd-relative
    /// `.foreman/`) so multiple supervisors can run against different repos
    /// on the same machine.
    pub fn load() -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".foreman/config.yaml"))
            .merge(Yaml::file(".foreman/local.yaml"))
            .merge(Env::prefixed("FOREMAN_").split("__"))
            .extract()
            .map_err(ConfigError::Extract)?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .map_err(ConfigError::Extract)?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.pipeline_max_agents == 0 {
            return Err(ConfigError::ZeroMaxAgents);
        }
        if config.pipeline_tick_s == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if config.agent_timeout_s == 0 {
            return Err(ConfigError::ZeroAgentTimeout);
        }
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let mut seen = std::collections::HashSet::new();
        let mut primary_count = 0;
        for repo in &config.repos {
            if !seen.insert(repo.path.as_str()) {
                return Err(ConfigError::DuplicateRepo(repo.path.clone()));
            }
            if repo.primary {
                primary_count += 1;
            }
        }
        if primary_count > 1 {
            return Err(ConfigError::MultiplePrimaryRepos);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RepoConfig;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn zero_max_agents_rejected() {
        let mut config = Config::default();
        config.pipeline_max_agents = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::ZeroMaxAgents)));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));
    }

    fn repo(path: &str, primary: bool) -> RepoConfig {
        RepoConfig {
            path: path.to_string(),
            primary,
            manual_merge: false,
            test_command: vec!["cargo".into(), "test".into()],
            build_command: vec!["cargo".into(), "build".into()],
            prompt_suffix: None,
        }
    }

    #[test]
    fn duplicate_repo_path_rejected() {
        let mut config = Config::default();
        config.repos = vec![repo("/a", false), repo("/a", false)];
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::DuplicateRepo(_))));
    }

    #[test]
    fn multiple_primary_repos_rejected() {
        let mut config = Config::default();
        config.repos = vec![repo("/a", true), repo("/b", true)];
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::MultiplePrimaryRepos)));
    }

    #[test]
    fn yaml_override_merges_over_defaults() {
        let yaml = "pipeline_max_agents: 7\nmodel: opus\n";
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
            .unwrap();
        assert_eq!(config.pipeline_max_agents, 7);
        assert_eq!(config.model, "opus");
        assert_eq!(config.pipeline_tick_s, Config::default().pipeline_tick_s);
    }
}
