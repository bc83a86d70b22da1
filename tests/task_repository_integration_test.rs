//! Exercises `TaskRepository` against a real (in-memory) `SQLite` store,
//! covering the create/dispatch/recycle/crash-recovery lifecycle.

mod helpers;

use foreman::domain::models::{Task, TaskCreator, TaskStatus};
use foreman::domain::ports::TaskRepository;

#[tokio::test]
async fn create_then_get_round_trips_fields() {
    let store = helpers::database::setup_test_store().await;

    let task = Task::new("fix flaky test", "the CI job flakes on main", "/repo/a", TaskCreator::Backlog, "#eng");
    let id = store.tasks.create(&task).await.expect("create");

    let fetched = store.tasks.get(id).await.expect("get").expect("task exists");
    assert_eq!(fetched.title, "fix flaky test");
    assert_eq!(fetched.repo_path, "/repo/a");
    assert_eq!(fetched.status, TaskStatus::Backlog);
    assert_eq!(fetched.creator, TaskCreator::Backlog);
}

#[tokio::test]
async fn get_next_active_orders_by_priority_then_age() {
    let store = helpers::database::setup_test_store().await;

    let mut backlog = Task::new("backlog task", "d", "/repo/a", TaskCreator::Seeder, "");
    backlog.status = TaskStatus::Backlog;
    let mut rebase = Task::new("rebase task", "d", "/repo/a", TaskCreator::Seeder, "");
    rebase.status = TaskStatus::Rebase;

    store.tasks.create(&backlog).await.unwrap();
    store.tasks.create(&rebase).await.unwrap();

    let next = store.tasks.get_next_active(10).await.unwrap();
    assert_eq!(next.len(), 2);
    assert_eq!(next[0].status, TaskStatus::Rebase, "rebase has the lowest priority value and sorts first");
}

#[tokio::test]
async fn mark_and_clear_dispatched_round_trips() {
    let store = helpers::database::setup_test_store().await;
    let task = Task::new("t", "d", "/repo/a", TaskCreator::Director, "");
    let id = store.tasks.create(&task).await.unwrap();

    assert!(!store.tasks.is_dispatched(id).await.unwrap());
    store.tasks.mark_dispatched(id).await.unwrap();
    assert!(store.tasks.is_dispatched(id).await.unwrap());

    store.tasks.clear_dispatched(id).await.unwrap();
    assert!(!store.tasks.is_dispatched(id).await.unwrap());
}

#[tokio::test]
async fn clear_all_dispatched_is_crash_recovery() {
    let store = helpers::database::setup_test_store().await;
    let a = store.tasks.create(&Task::new("a", "d", "/repo/a", TaskCreator::Director, "")).await.unwrap();
    let b = store.tasks.create(&Task::new("b", "d", "/repo/a", TaskCreator::Director, "")).await.unwrap();
    store.tasks.mark_dispatched(a).await.unwrap();
    store.tasks.mark_dispatched(b).await.unwrap();

    store.tasks.clear_all_dispatched().await.unwrap();

    assert!(!store.tasks.is_dispatched(a).await.unwrap());
    assert!(!store.tasks.is_dispatched(b).await.unwrap());
}

#[tokio::test]
async fn find_active_by_title_dedupes_health_monitor_repairs() {
    let store = helpers::database::setup_test_store().await;
    assert!(store.tasks.find_active_by_title("Fix failing build on main").await.unwrap().is_none());

    let task = Task::new("Fix failing build on main", "d", "/repo/a", foreman::domain::models::TaskCreator::HealthCheck, "");
    store.tasks.create(&task).await.unwrap();

    let found = store.tasks.find_active_by_title("Fix failing build on main").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn recycle_then_update_resets_to_backlog() {
    let store = helpers::database::setup_test_store().await;
    let mut task = Task::new("t", "d", "/repo/a", TaskCreator::Director, "");
    task.id = store.tasks.create(&task).await.unwrap();
    task.status = TaskStatus::Retry;
    task.attempt_count = 2;
    task.branch = "task-1".to_string();
    store.tasks.update(&task).await.unwrap();

    task.recycle();
    store.tasks.update(&task).await.unwrap();

    let fetched = store.tasks.get(task.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, TaskStatus::Backlog);
    assert_eq!(fetched.attempt_count, 0);
    assert!(fetched.branch.is_empty());
}
