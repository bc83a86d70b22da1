//! Integration queue inspection (spec.md §6).

use anyhow::Result;
use comfy_table::{presets, Attribute, Cell, Table};

use crate::adapters::sqlite::Store;

pub async fn list(store: &Store, repo: String, json_output: bool) -> Result<()> {
    let entries = store.queue.get_queued(&repo).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Task").add_attribute(Attribute::Bold),
        Cell::new("Branch").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("PR").add_attribute(Attribute::Bold),
        Cell::new("Unknown retries").add_attribute(Attribute::Bold),
    ]);
    for e in &entries {
        table.add_row(vec![
            e.task_id.to_string(),
            e.branch.clone(),
            e.status.as_str().to_string(),
            e.pr_number.map(|n| format!("#{n}")).unwrap_or_default(),
            e.unknown_retries.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
