//! Single-writer SQLite connection pool, WAL mode.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to create pool: {0}")]
    PoolCreation(#[source] sqlx::Error),
    #[error("invalid database path: {0}")]
    InvalidPath(String),
    #[error("failed to create database directory: {0}")]
    DirectoryCreation(#[source] std::io::Error),
}

/// The Store is single-writer; a small pool is plenty since SQLite
/// serializes writers anyway and every suspension point already accounts
/// for that (spec.md §5).
pub async fn create_pool(db_path: &str) -> Result<SqlitePool, ConnectionError> {
    ensure_parent_dir(db_path)?;

    let options = SqliteConnectOptions::from_str(db_path)
        .map_err(|_| ConnectionError::InvalidPath(db_path.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(ConnectionError::PoolCreation)
}

pub async fn create_memory_pool() -> Result<SqlitePool, ConnectionError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|_| ConnectionError::InvalidPath("sqlite::memory:".to_string()))?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .shared_cache(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(ConnectionError::PoolCreation)
}

fn ensure_parent_dir(db_path: &str) -> Result<(), ConnectionError> {
    let stripped = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
    if stripped == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(stripped).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(ConnectionError::DirectoryCreation)?;
        }
    }
    Ok(())
}
