use foreman::Store;

/// Create an in-memory `SQLite` store for testing, migrated and ready to use.
#[allow(dead_code)]
pub async fn setup_test_store() -> Store {
    let store = Store::connect_memory().await.expect("failed to create in-memory store");
    store.migrate().await.expect("failed to run migrations");
    store
}
