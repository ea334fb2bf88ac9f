//! Admin API endpoints
//!
//! Settings, integrations, analytics, server stats, and the AI generation
//! bridge. Everything here sits behind `require_auth` + `require_admin`.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::engine::client::GenerateContentRequest;
use crate::engine::product_gen::ProductBrief;
use crate::engine::GeneratedProduct;
use crate::models::integration::{Integration, Provider};
use crate::services::analytics::AnalyticsSummary;
use crate::services::settings::{SiteSettings, UpdateSettingsInput};

#[derive(Debug, Deserialize)]
pub struct UpdateIntegrationRequest {
    pub enabled: bool,
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
pub struct ToggleIntegrationRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentBody {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub category: String,
    pub outline: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_content_type() -> String {
    "blog_post".to_string()
}

fn default_language() -> String {
    "id".to_string()
}

/// Build the admin router (settings, integrations, analytics, AI)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
        .route("/integrations", get(list_integrations))
        .route("/integrations/{provider}", put(update_integration))
        .route(
            "/integrations/{provider}/enabled",
            patch(toggle_integration),
        )
        .route("/analytics", get(analytics_summary))
        .route("/stats", get(server_stats))
        .route("/ai/generate-product", post(generate_product))
        .route("/ai/generate-content", post(generate_content))
}

/// GET /api/v1/admin/settings
async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings_service.get_site_settings().await?))
}

/// PUT /api/v1/admin/settings
async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsInput>,
) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings_service.update(input).await?))
}

/// GET /api/v1/admin/integrations
async fn list_integrations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Integration>>, ApiError> {
    Ok(Json(state.integration_service.list().await?))
}

/// PUT /api/v1/admin/integrations/{provider}
async fn update_integration(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(request): Json<UpdateIntegrationRequest>,
) -> Result<Json<Integration>, ApiError> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown provider: {}", provider)))?;

    let integration = state
        .integration_service
        .update(provider, request.enabled, request.config)
        .await?;

    Ok(Json(integration))
}

/// PATCH /api/v1/admin/integrations/{provider}/enabled
///
/// Flips the flag without touching the stored config, so a channel can be
/// paused and resumed without re-entering its settings.
async fn toggle_integration(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(request): Json<ToggleIntegrationRequest>,
) -> Result<Json<Integration>, ApiError> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown provider: {}", provider)))?;

    state
        .integration_service
        .set_enabled(provider, request.enabled)
        .await?;

    Ok(Json(state.integration_service.get(provider).await?))
}

/// GET /api/v1/admin/analytics?days=30
async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    Ok(Json(state.analytics_service.summary(query.days).await?))
}

/// GET /api/v1/admin/stats - Server request statistics
async fn server_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = &state.request_stats;
    Json(serde_json::json!({
        "total_requests": stats.total_requests(),
        "avg_response_time_us": stats.avg_response_time_us(),
        "uptime_seconds": stats.uptime_seconds(),
    }))
}

/// POST /api/v1/admin/ai/generate-product - Full product draft pipeline
async fn generate_product(
    State(state): State<AppState>,
    Json(brief): Json<ProductBrief>,
) -> Result<Json<GeneratedProduct>, ApiError> {
    state
        .integration_service
        .require_enabled(Provider::Engine)
        .await?;

    if brief.name.trim().is_empty() {
        return Err(ApiError::validation_error("Product name cannot be empty"));
    }

    let generated = state.product_generator.generate(&brief).await?;

    Ok(Json(generated))
}

/// POST /api/v1/admin/ai/generate-content - Raw content generation (blog)
async fn generate_content(
    State(state): State<AppState>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .integration_service
        .require_enabled(Provider::Engine)
        .await?;

    if body.outline.trim().is_empty() {
        return Err(ApiError::validation_error("Outline cannot be empty"));
    }

    let content = state
        .engine_client
        .generate_content(&GenerateContentRequest {
            content_type: body.content_type,
            category: body.category,
            outline: body.outline,
            language: body.language,
        })
        .await?;

    Ok(Json(serde_json::json!({
        "title": content.title,
        "body": content.body,
    })))
}
