//! `foreman queue list` against a real store (spec.md §6).

mod helpers;

use foreman::cli::commands::queue;
use foreman::domain::ports::QueueRepository;

#[tokio::test]
async fn list_returns_only_entries_for_the_requested_repo() {
    let store = helpers::database::setup_test_store().await;
    store.queue.enqueue(1, "task-1", "/repo/a").await.unwrap();
    store.queue.enqueue(2, "task-2", "/repo/b").await.unwrap();

    let entries = store.queue.get_queued("/repo/a").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].branch, "task-1");

    queue::list(&store, "/repo/a".to_string(), false).await.expect("list should succeed");
    queue::list(&store, "/repo/does-not-exist".to_string(), false).await.expect("empty repo should still succeed");
}
