//! Idempotent, embedded SQL migrations (spec.md §4.1).
//!
//! Each migration is attempted once (tracked by `schema_migrations`); within
//! a migration, `CREATE TABLE/INDEX IF NOT EXISTS` statements are naturally
//! idempotent, and a bare `ALTER TABLE ADD COLUMN` that fails because the
//! column already exists (e.g. a database seeded from a future schema) is
//! silently accepted rather than treated as fatal.

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} failed: {source}")]
    Execution { version: i64, #[source] source: sqlx::Error },
    #[error("failed to read schema version: {0}")]
    VersionCheck(#[source] sqlx::Error),
}

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "initial schema",
            sql: include_str!("../../../migrations/001_initial_schema.sql"),
        },
        Migration {
            version: 2,
            description: "queue invariants and dispatch tracking",
            sql: include_str!("../../../migrations/002_queue_invariants.sql"),
        },
    ]
}

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run(&self, migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current = self.current_version().await?;
        let pending: Vec<_> = migrations.into_iter().filter(|m| m.version > current).collect();
        for migration in &pending {
            self.apply(migration).await?;
        }
        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|source| MigrationError::Execution { version: 0, source })?;
        Ok(())
    }

    async fn current_version(&self) -> Result<i64, MigrationError> {
        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(MigrationError::VersionCheck)?;
        Ok(row.0)
    }

    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        for statement in split_statements(migration.sql) {
            if let Err(err) = sqlx::raw_sql(statement).execute(&self.pool).await {
                if is_duplicate_column_error(&err) {
                    tracing::debug!(version = migration.version, "statement already applied, skipping");
                    continue;
                }
                return Err(MigrationError::Execution { version: migration.version, source: err });
            }
        }

        sqlx::query("INSERT OR IGNORE INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&self.pool)
            .await
            .map_err(|source| MigrationError::Execution { version: migration.version, source })?;

        Ok(())
    }
}

fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn is_duplicate_column_error(err: &sqlx::Error) -> bool {
    err.to_string().contains("duplicate column name")
}
