//! Visitor analytics
//!
//! Thin aggregation layer over the event log. Recording is fire-and-forget
//! from the storefront's point of view; the summary feeds the admin
//! dashboard.

use crate::db::repositories::{EventRepository, ProductClickCount};
use crate::models::event::{EventType, RecordEventInput, VisitorEvent};
use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Default window for the "recent events" figure
pub const DEFAULT_SUMMARY_DAYS: i64 = 30;

/// Error types for analytics operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Aggregated analytics for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_events: i64,
    pub page_views: i64,
    pub whatsapp_clicks: i64,
    pub marketplace_clicks: i64,
    /// Products by checkout clicks, descending
    pub top_products: Vec<ProductClickCount>,
    /// Events inside the requested window
    pub recent_events: i64,
    /// Window length in days
    pub window_days: i64,
}

/// Analytics service
pub struct AnalyticsService {
    events: Arc<dyn EventRepository>,
}

impl AnalyticsService {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Record a visitor event.
    pub async fn record(&self, input: RecordEventInput) -> Result<(), AnalyticsServiceError> {
        if input.path.trim().is_empty() {
            return Err(AnalyticsServiceError::ValidationError(
                "Event path cannot be empty".to_string(),
            ));
        }

        let event = VisitorEvent {
            id: 0,
            event_type: input.event_type,
            path: input.path,
            product_slug: input.product_slug,
            referrer: input.referrer,
            user_agent: input.user_agent,
            created_at: Utc::now(),
        };

        self.events
            .record(&event)
            .await
            .context("Failed to record event")?;

        Ok(())
    }

    /// Build the dashboard summary for a trailing window of days.
    pub async fn summary(
        &self,
        window_days: Option<i64>,
    ) -> Result<AnalyticsSummary, AnalyticsServiceError> {
        let window_days = window_days.unwrap_or(DEFAULT_SUMMARY_DAYS);
        if !(1..=365).contains(&window_days) {
            return Err(AnalyticsServiceError::ValidationError(
                "Window must be between 1 and 365 days".to_string(),
            ));
        }

        let total_events = self
            .events
            .count_total()
            .await
            .context("Failed to count events")?;

        let by_type = self
            .events
            .counts_by_type()
            .await
            .context("Failed to count events by type")?;
        let count_of = |t: EventType| {
            by_type
                .iter()
                .find(|(et, _)| *et == t)
                .map(|(_, c)| *c)
                .unwrap_or(0)
        };

        let top_products = self
            .events
            .top_products(10)
            .await
            .context("Failed to get top products")?;

        let recent_events = self
            .events
            .count_since(Utc::now() - ChronoDuration::days(window_days))
            .await
            .context("Failed to count recent events")?;

        Ok(AnalyticsSummary {
            total_events,
            page_views: count_of(EventType::PageView),
            whatsapp_clicks: count_of(EventType::WhatsappClick),
            marketplace_clicks: count_of(EventType::MarketplaceClick),
            top_products,
            recent_events,
            window_days,
        })
    }
}
