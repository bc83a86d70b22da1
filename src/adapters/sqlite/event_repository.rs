//! SQLite implementation of `EventRepository`. Never surfaces an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::domain::models::{Event, EventLevel, MAX_EVENTS};
use crate::domain::ports::EventRepository;

#[derive(Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn log_event(&self, event: Event) {
        let metadata_json = serde_json::to_string(&event.metadata).unwrap_or_else(|_| "{}".to_string());
        let insert = sqlx::query(
            "INSERT INTO events (created_at, level, category, message, metadata) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.created_at.to_rfc3339())
        .bind(event.level.as_str())
        .bind(&event.category)
        .bind(&event.message)
        .bind(metadata_json)
        .execute(&self.pool)
        .await;

        if let Err(err) = insert {
            tracing::warn!(error = %err, "failed to persist event; dropping");
            return;
        }

        let prune = sqlx::query(
            "DELETE FROM events WHERE id IN
             (SELECT id FROM events ORDER BY id DESC LIMIT -1 OFFSET ?)",
        )
        .bind(MAX_EVENTS)
        .execute(&self.pool)
        .await;

        if let Err(err) = prune {
            tracing::warn!(error = %err, "failed to prune events table");
        }
    }

    async fn recent(&self, limit: i64) -> Vec<Event> {
        let rows: Vec<(i64, String, String, String, String, String)> = match sqlx::query_as(
            "SELECT id, created_at, level, category, message, metadata FROM events ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read events");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|(id, created_at, level, category, message, metadata)| {
                let created_at = DateTime::parse_from_rfc3339(&created_at).ok()?.with_timezone(&Utc);
                let level = EventLevel::from_str(&level)?;
                let metadata: HashMap<String, String> = serde_json::from_str(&metadata).unwrap_or_default();
                Some(Event {
                    id,
                    created_at,
                    level,
                    category,
                    message,
                    metadata,
                })
            })
            .collect()
    }
}
