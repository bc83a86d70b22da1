//! `settings set` (spec.md §6 `PUT /settings`): persists one allow-listed
//! override so the running supervisor (and future invocations of this CLI)
//! pick it up without editing `.foreman/config.yaml`.

use anyhow::{bail, Result};
use serde_json::json;

use crate::adapters::sqlite::Store;
use crate::domain::models::{Config, SettingsPatch};
use crate::services::settings;

pub async fn set(store: &Store, key: String, value: String, json_output: bool) -> Result<()> {
    let mut patch = SettingsPatch::default();
    match key.as_str() {
        "continuous_mode" => patch.continuous_mode = Some(value.parse()?),
        "release_interval_mins" => patch.release_interval_mins = Some(value.parse()?),
        "pipeline_max_backlog" => patch.pipeline_max_backlog = Some(value.parse()?),
        "agent_timeout_s" => patch.agent_timeout_s = Some(value.parse()?),
        "pipeline_seed_cooldown_s" => patch.pipeline_seed_cooldown_s = Some(value.parse()?),
        "pipeline_tick_s" => patch.pipeline_tick_s = Some(value.parse()?),
        "model" => patch.model = Some(value.clone()),
        "container_memory_mb" => patch.container_memory_mb = Some(value.parse()?),
        "assistant_name" => patch.assistant_name = Some(value.clone()),
        "pipeline_max_agents" => patch.pipeline_max_agents = Some(value.parse()?),
        other => bail!("'{other}' is not an operator-tunable setting"),
    }

    let mut config = Config::default();
    settings::refresh(&*store.state, &mut config).await?;
    let changed = settings::persist(&*store.state, &*store.events, &mut config, &patch).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "changed": changed }))?);
    } else {
        for (k, v) in &changed {
            println!("{k} = {v}");
        }
    }
    Ok(())
}
