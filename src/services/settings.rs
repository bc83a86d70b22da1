//! Operator-settings persistence (spec.md §6 `PUT /settings`): the fixed
//! allow-list of tunables lives in `generic_state` under a `setting:` prefix
//! so it survives restarts and crosses the process boundary between a CLI
//! control command and the running supervisor (SPEC_FULL.md §2 "Settings
//! mutation audit").

use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, Event, EventLevel, SettingsPatch};
use crate::domain::ports::{EventRepository, StateRepository};

fn key(name: &str) -> String {
    format!("setting:{name}")
}

/// Re-reads every persisted setting override and applies it onto `config`.
/// Called once at boot and once per scheduler tick, so a setting persisted
/// by a separate CLI invocation takes effect without a restart.
pub async fn refresh(state: &dyn StateRepository, config: &mut Config) -> DomainResult<()> {
    if let Some(v) = state.get(&key("continuous_mode")).await? {
        if let Ok(b) = v.parse() {
            config.continuous_mode = b;
        }
    }
    if let Some(v) = state.get(&key("release_interval_mins")).await? {
        if let Ok(n) = v.parse() {
            config.release_interval_mins = n;
        }
    }
    if let Some(v) = state.get(&key("pipeline_max_backlog")).await? {
        if let Ok(n) = v.parse() {
            config.pipeline_max_backlog = n;
        }
    }
    if let Some(v) = state.get(&key("agent_timeout_s")).await? {
        if let Ok(n) = v.parse() {
            config.agent_timeout_s = n;
        }
    }
    if let Some(v) = state.get(&key("pipeline_seed_cooldown_s")).await? {
        if let Ok(n) = v.parse() {
            config.pipeline_seed_cooldown_s = n;
        }
    }
    if let Some(v) = state.get(&key("pipeline_tick_s")).await? {
        if let Ok(n) = v.parse() {
            config.pipeline_tick_s = n;
        }
    }
    if let Some(v) = state.get(&key("model")).await? {
        config.model = v;
    }
    if let Some(v) = state.get(&key("container_memory_mb")).await? {
        if let Ok(n) = v.parse() {
            config.container_memory_mb = n;
        }
    }
    if let Some(v) = state.get(&key("assistant_name")).await? {
        config.assistant_name = v;
    }
    if let Some(v) = state.get(&key("pipeline_max_agents")).await? {
        if let Ok(n) = v.parse() {
            config.pipeline_max_agents = n;
        }
    }
    Ok(())
}

/// Apply `patch` to `config`, persist every changed field, and audit-log the
/// change. Returns the (key, value) pairs that changed.
pub async fn persist(
    state: &dyn StateRepository,
    events: &dyn EventRepository,
    config: &mut Config,
    patch: &SettingsPatch,
) -> DomainResult<Vec<(&'static str, String)>> {
    let changed = patch.apply(config);
    for (name, debug_value) in &changed {
        // `SettingsPatch::apply` logs the Debug-formatted value (quoted for
        // strings); store the plain field value instead so `refresh` can
        // round-trip it without stripping quotes.
        let raw = plain_value(config, name);
        state.set(&key(name), &raw).await?;
        events
            .log_event(Event::new(EventLevel::Info, "settings", format!("{name} changed to {debug_value}")))
            .await;
        info!(setting = name, value = %raw, "operator setting persisted");
    }
    Ok(changed)
}

fn plain_value(config: &Config, name: &str) -> String {
    match name {
        "continuous_mode" => config.continuous_mode.to_string(),
        "release_interval_mins" => config.release_interval_mins.to_string(),
        "pipeline_max_backlog" => config.pipeline_max_backlog.to_string(),
        "agent_timeout_s" => config.agent_timeout_s.to_string(),
        "pipeline_seed_cooldown_s" => config.pipeline_seed_cooldown_s.to_string(),
        "pipeline_tick_s" => config.pipeline_tick_s.to_string(),
        "model" => config.model.clone(),
        "container_memory_mb" => config.container_memory_mb.to_string(),
        "assistant_name" => config.assistant_name.clone(),
        "pipeline_max_agents" => config.pipeline_max_agents.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::Store;

    #[tokio::test]
    async fn persisted_setting_survives_a_fresh_config_via_refresh() {
        let store = Store::connect_memory().await.unwrap();
        store.migrate().await.unwrap();

        let mut config = Config::default();
        let patch = SettingsPatch {
            pipeline_max_agents: Some(9),
            model: Some("opus".to_string()),
            ..Default::default()
        };
        persist(&*store.state, &*store.events, &mut config, &patch).await.unwrap();

        let mut fresh = Config::default();
        refresh(&*store.state, &mut fresh).await.unwrap();
        assert_eq!(fresh.pipeline_max_agents, 9);
        assert_eq!(fresh.model, "opus");
        assert_eq!(fresh.pipeline_tick_s, Config::default().pipeline_tick_s);
    }
}
