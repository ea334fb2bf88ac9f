//! Visitor tracking endpoint
//!
//! Fire-and-forget beacon from the storefront. Defaults to a page view;
//! the storefront may also report click events for handoff links it
//! renders itself (checkout handlers record their own clicks server-side).

use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::event::{EventType, RecordEventInput};

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub path: String,
    /// One of `page_view`, `whatsapp_click`, `marketplace_click`;
    /// defaults to `page_view`
    pub event_type: Option<String>,
    pub product_slug: Option<String>,
    pub referrer: Option<String>,
}

/// Build the tracking router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(track))
}

/// POST /api/v1/track
async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event_type = match request.event_type.as_deref() {
        Some(s) => EventType::parse(s)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown event type: {}", s)))?,
        None => EventType::PageView,
    };

    let mut input = RecordEventInput::new(event_type, request.path);
    input.product_slug = request.product_slug;
    input.referrer = request.referrer;
    input.user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.analytics_service.record(input).await?;

    Ok(Json(serde_json::json!({"recorded": true})))
}
