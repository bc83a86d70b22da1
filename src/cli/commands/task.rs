//! Task control-surface commands (spec.md §6).

use anyhow::{bail, Result};
use comfy_table::{presets, Attribute, Cell, Table};
use serde_json::json;

use crate::adapters::sqlite::Store;
use crate::domain::models::{Task, TaskCreator, TaskStatus};

pub async fn create(store: &Store, title: String, description: String, repo: String, notify_channel: String, json_output: bool) -> Result<()> {
    let task = Task::new(title, description, repo, TaskCreator::Director, notify_channel);
    let id = store.tasks.create(&task).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "task_id": id }))?);
    } else {
        println!("created task #{id}");
    }
    Ok(())
}

pub async fn list(store: &Store, status: Option<String>, json_output: bool) -> Result<()> {
    let tasks = match status {
        Some(s) => {
            let Some(status) = TaskStatus::from_str(&s) else {
                bail!("unknown task status '{s}'");
            };
            store.tasks.list_by_status(status).await?
        }
        None => store.tasks.list_active().await?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Repo").add_attribute(Attribute::Bold),
        Cell::new("Attempts").add_attribute(Attribute::Bold),
    ]);
    for t in &tasks {
        table.add_row(vec![
            t.id.to_string(),
            t.status.as_str().to_string(),
            t.title.clone(),
            t.repo_path.clone(),
            format!("{}/{}", t.attempt_count, t.max_attempts),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show(store: &Store, id: i64, json_output: bool) -> Result<()> {
    let Some(task) = store.tasks.get(id).await? else {
        bail!("task #{id} not found");
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&task)?);
        return Ok(());
    }

    println!("task #{}: {}", task.id, task.title);
    println!("  status:      {}", task.status.as_str());
    println!("  repo:        {}", task.repo_path);
    println!("  branch:      {}", task.branch);
    println!("  creator:     {}", task.creator.as_str());
    println!("  attempts:    {}/{}", task.attempt_count, task.max_attempts);
    println!("  created_at:  {}", task.created_at);
    println!("  updated_at:  {}", task.updated_at);
    if let Some(err) = &task.last_error {
        println!("  last_error:  {err}");
    }
    Ok(())
}

pub async fn retry(store: &Store, id: i64, json_output: bool) -> Result<()> {
    let Some(mut task) = store.tasks.get(id).await? else {
        bail!("task #{id} not found");
    };
    task.recycle();
    store.tasks.update(&task).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "task_id": id, "status": task.status.as_str() }))?);
    } else {
        println!("task #{id} reset to backlog");
    }
    Ok(())
}

pub async fn cancel(store: &Store, id: i64, json_output: bool) -> Result<()> {
    let Some(mut task) = store.tasks.get(id).await? else {
        bail!("task #{id} not found");
    };
    task.transition(TaskStatus::Failed);
    task.set_last_error("cancelled by operator");
    store.tasks.update(&task).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "task_id": id, "status": "failed" }))?);
    } else {
        println!("task #{id} cancelled");
    }
    Ok(())
}
