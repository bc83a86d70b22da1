//! Proposal review commands (spec.md §4.6, §6): the human-approval gate for
//! feature-discovery and architecture-review seed modes.

use anyhow::{bail, Result};
use comfy_table::{presets, Attribute, Cell, Table};
use serde_json::json;

use crate::adapters::sqlite::Store;
use crate::domain::models::{ProposalStatus, Task, TaskCreator};

pub async fn list(store: &Store, status: Option<String>, json_output: bool) -> Result<()> {
    let status = match status {
        Some(s) => {
            let Some(status) = ProposalStatus::from_str(&s) else {
                bail!("unknown proposal status '{s}'");
            };
            status
        }
        None => ProposalStatus::Proposed,
    };
    let proposals = store.proposals.list_by_status(status).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Repo").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
    ]);
    for p in &proposals {
        table.add_row(vec![
            p.id.to_string(),
            p.repo_path.clone(),
            p.title.clone(),
            p.triage.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Approve a proposal: files the task it describes and marks it approved.
pub async fn approve(store: &Store, id: i64, json_output: bool) -> Result<()> {
    let Some(mut proposal) = store.proposals.get(id).await? else {
        bail!("proposal #{id} not found");
    };

    let task = Task::new(proposal.title.clone(), proposal.description.clone(), proposal.repo_path.clone(), TaskCreator::Proposal, "");
    let task_id = store.tasks.create(&task).await?;

    proposal.status = ProposalStatus::Approved;
    store.proposals.update(&proposal).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "proposal_id": id, "task_id": task_id }))?);
    } else {
        println!("proposal #{id} approved, filed as task #{task_id}");
    }
    Ok(())
}

pub async fn dismiss(store: &Store, id: i64, json_output: bool) -> Result<()> {
    let Some(mut proposal) = store.proposals.get(id).await? else {
        bail!("proposal #{id} not found");
    };
    proposal.status = ProposalStatus::Dismissed;
    store.proposals.update(&proposal).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "proposal_id": id, "status": "dismissed" }))?);
    } else {
        println!("proposal #{id} dismissed");
    }
    Ok(())
}
