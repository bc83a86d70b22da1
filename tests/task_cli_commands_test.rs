//! `foreman task ...` commands against a real store (spec.md §6).

mod helpers;

use foreman::cli::commands::task;
use foreman::domain::models::TaskStatus;
use foreman::domain::ports::TaskRepository;

#[tokio::test]
async fn create_list_show_round_trip() {
    let store = helpers::database::setup_test_store().await;

    task::create(&store, "add caching".into(), "speeds up repeat queries".into(), "/repo/a".into(), "#eng".into(), false)
        .await
        .unwrap();

    let tasks = store.tasks.list_active().await.unwrap();
    assert_eq!(tasks.len(), 1);
    let id = tasks[0].id;

    task::show(&store, id, false).await.expect("show should find the task");
    task::show(&store, id + 1, false).await.expect_err("show should error on an unknown id");
}

#[tokio::test]
async fn retry_recycles_an_exhausted_task() {
    let store = helpers::database::setup_test_store().await;
    task::create(&store, "t".into(), "d".into(), "/repo/a".into(), "".into(), false).await.unwrap();
    let mut t = store.tasks.list_active().await.unwrap().remove(0);
    t.status = TaskStatus::Failed;
    t.attempt_count = 5;
    store.tasks.update(&t).await.unwrap();

    task::retry(&store, t.id, false).await.unwrap();

    let refreshed = store.tasks.get(t.id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, TaskStatus::Backlog);
    assert_eq!(refreshed.attempt_count, 0);
}

#[tokio::test]
async fn cancel_marks_failed_with_an_operator_note() {
    let store = helpers::database::setup_test_store().await;
    task::create(&store, "t".into(), "d".into(), "/repo/a".into(), "".into(), false).await.unwrap();
    let id = store.tasks.list_active().await.unwrap().remove(0).id;

    task::cancel(&store, id, false).await.unwrap();

    let cancelled = store.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, TaskStatus::Failed);
    assert_eq!(cancelled.last_error.as_deref(), Some("cancelled by operator"));
}

#[tokio::test]
async fn list_filters_by_explicit_status() {
    let store = helpers::database::setup_test_store().await;
    task::create(&store, "a".into(), "d".into(), "/repo/a".into(), "".into(), false).await.unwrap();
    let mut t = store.tasks.list_active().await.unwrap().remove(0);
    t.status = TaskStatus::Qa;
    store.tasks.update(&t).await.unwrap();

    task::list(&store, Some("qa".to_string()), false).await.unwrap();
    task::list(&store, Some("not-a-status".to_string()), false)
        .await
        .expect_err("unknown status string should error");
}
