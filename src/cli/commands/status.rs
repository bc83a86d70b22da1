//! `status` (spec.md §6 `GET /status` contract, exposed locally).

use anyhow::Result;
use console::style;

use crate::adapters::sqlite::Store;
use crate::domain::control::StatusSummary;
use crate::domain::models::Config;

pub async fn show(store: &Store, config: &Config, json_output: bool) -> Result<()> {
    let summary = StatusSummary {
        active_tasks: store.active_task_count().await?,
        queued_integrations: store.queued_integration_count().await?,
        in_flight_agents: 0,
        max_agents: config.pipeline_max_agents,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", style("active tasks:").bold(), summary.active_tasks);
    println!("{} {}", style("queued integrations:").bold(), summary.queued_integrations);
    println!("{} {}", style("max agents:").bold(), summary.max_agents);
    println!("{}", style("(in-flight agent count reflects a running supervisor process only)").dim());
    Ok(())
}
