//! Checkout API endpoints
//!
//! Returns handoff links; the storefront opens them in a new tab. A 403
//! here means the channel is switched off in the admin.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::integration::Provider;
use crate::services::checkout::CheckoutLink;

#[derive(Debug, Deserialize)]
pub struct WhatsappQuery {
    pub product: String,
    #[serde(default = "default_quantity", alias = "qty")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct MarketplaceQuery {
    pub product: String,
}

/// Build the checkout router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/whatsapp", get(whatsapp_link))
        .route("/marketplace/{provider}", get(marketplace_link))
}

/// GET /api/v1/checkout/whatsapp?product={slug}&quantity={n}
async fn whatsapp_link(
    State(state): State<AppState>,
    Query(query): Query<WhatsappQuery>,
) -> Result<Json<CheckoutLink>, ApiError> {
    let link = state
        .checkout_service
        .whatsapp_link(&query.product, query.quantity)
        .await?;
    Ok(Json(link))
}

/// GET /api/v1/checkout/marketplace/{provider}?product={slug}
async fn marketplace_link(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<MarketplaceQuery>,
) -> Result<Json<CheckoutLink>, ApiError> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown provider: {}", provider)))?;

    let link = state
        .checkout_service
        .marketplace_link(provider, &query.product)
        .await?;
    Ok(Json(link))
}
