//! Site info API endpoints
//!
//! Public storefront metadata: store identity plus which checkout
//! channels are currently available.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::integration::Provider;

#[derive(Debug, Serialize)]
pub struct SiteInfoResponse {
    pub store_name: String,
    pub tagline: String,
    pub address: String,
    pub currency: String,
    pub products_per_page: u32,
    /// Names of the enabled checkout channels
    pub channels: Vec<String>,
}

/// Build the site router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(site_info))
}

/// GET /api/v1/site
async fn site_info(State(state): State<AppState>) -> Result<Json<SiteInfoResponse>, ApiError> {
    let settings = state.settings_service.get_site_settings().await?;

    let channels = state
        .integration_service
        .list()
        .await?
        .into_iter()
        .filter(|i| i.enabled && i.provider != Provider::Engine)
        .map(|i| i.provider.as_str().to_string())
        .collect();

    Ok(Json(SiteInfoResponse {
        store_name: settings.store_name,
        tagline: settings.tagline,
        address: settings.address,
        currency: settings.currency,
        products_per_page: settings.products_per_page,
        channels,
    }))
}
