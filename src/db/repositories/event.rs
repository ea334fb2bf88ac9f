//! Visitor event repository
//!
//! Append-only event log plus the aggregate queries behind the admin
//! analytics summary.

use crate::models::event::{EventType, VisitorEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Per-product click aggregate
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProductClickCount {
    pub product_slug: String,
    pub clicks: i64,
}

/// Visitor event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Record an event
    async fn record(&self, event: &VisitorEvent) -> Result<VisitorEvent>;

    /// Total number of recorded events
    async fn count_total(&self) -> Result<i64>;

    /// Number of events per type
    async fn counts_by_type(&self) -> Result<Vec<(EventType, i64)>>;

    /// Products with the most checkout clicks, descending
    async fn top_products(&self, limit: i64) -> Result<Vec<ProductClickCount>>;

    /// Number of events recorded since the given instant
    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64>;
}

/// SQLx-based event repository implementation
pub struct SqlxEventRepository {
    pool: SqlitePool,
}

impl SqlxEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn record(&self, event: &VisitorEvent) -> Result<VisitorEvent> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO visitor_events (event_type, path, product_slug, referrer, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(&event.path)
        .bind(&event.product_slug)
        .bind(&event.referrer)
        .bind(&event.user_agent)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to record visitor event")?;

        Ok(VisitorEvent {
            id: result.last_insert_rowid(),
            created_at: now,
            ..event.clone()
        })
    }

    async fn count_total(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM visitor_events")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count events")?;
        Ok(row.get("count"))
    }

    async fn counts_by_type(&self) -> Result<Vec<(EventType, i64)>> {
        let rows = sqlx::query(
            "SELECT event_type, COUNT(*) AS count FROM visitor_events GROUP BY event_type",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count events by type")?;

        let mut counts = Vec::new();
        for row in rows {
            let type_str: String = row.get("event_type");
            // Unknown types would only appear after a schema change; skip them
            if let Some(event_type) = EventType::parse(&type_str) {
                counts.push((event_type, row.get("count")));
            }
        }
        Ok(counts)
    }

    async fn top_products(&self, limit: i64) -> Result<Vec<ProductClickCount>> {
        let rows = sqlx::query(
            r#"
            SELECT product_slug, COUNT(*) AS clicks
            FROM visitor_events
            WHERE product_slug IS NOT NULL
              AND event_type IN ('whatsapp_click', 'marketplace_click')
            GROUP BY product_slug
            ORDER BY clicks DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get top products")?;

        Ok(rows
            .iter()
            .map(|row| ProductClickCount {
                product_slug: row.get("product_slug"),
                clicks: row.get("clicks"),
            })
            .collect())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM visitor_events WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count recent events")?;
        Ok(row.get("count"))
    }
}
