//! The operator-approval gate (spec.md §4.6): a proposal sits in `proposed`
//! until a human approves or dismisses it; approval files a real task.

mod helpers;

use foreman::cli::commands::proposal;
use foreman::domain::models::{Proposal, ProposalStatus};
use foreman::domain::ports::{ProposalRepository, TaskRepository};

#[tokio::test]
async fn approve_files_a_task_and_flips_status() {
    let store = helpers::database::setup_test_store().await;
    let created = Proposal::new("/repo/a", "add retry jitter", "smooths thundering-herd retries", "seen in incident review");
    let id = store.proposals.create(&created).await.unwrap();

    proposal::approve(&store, id, false).await.expect("approve should succeed");

    let approved = store.proposals.get(id).await.unwrap().unwrap();
    assert_eq!(approved.status, ProposalStatus::Approved);

    let active = store.tasks.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "add retry jitter");
}

#[tokio::test]
async fn dismiss_does_not_file_a_task() {
    let store = helpers::database::setup_test_store().await;
    let created = Proposal::new("/repo/a", "rewrite in a different language", "no", "low quality suggestion");
    let id = store.proposals.create(&created).await.unwrap();

    proposal::dismiss(&store, id, false).await.expect("dismiss should succeed");

    let dismissed = store.proposals.get(id).await.unwrap().unwrap();
    assert_eq!(dismissed.status, ProposalStatus::Dismissed);
    assert!(store.tasks.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn approve_unknown_id_errors() {
    let store = helpers::database::setup_test_store().await;
    assert!(proposal::approve(&store, 999, false).await.is_err());
}

#[tokio::test]
async fn list_defaults_to_proposed_status() {
    let store = helpers::database::setup_test_store().await;
    let proposed = store.proposals.create(&Proposal::new("/repo/a", "a", "d", "r")).await.unwrap();
    let mut approved = Proposal::new("/repo/a", "b", "d", "r");
    approved.id = store.proposals.create(&approved).await.unwrap();
    approved.status = ProposalStatus::Approved;
    store.proposals.update(&approved).await.unwrap();

    let still_proposed = store.proposals.list_by_status(ProposalStatus::Proposed).await.unwrap();
    assert_eq!(still_proposed.len(), 1);
    assert_eq!(still_proposed[0].id, proposed);
}
