//! API middleware
//!
//! Session authentication, admin authorization, the JSON error envelope,
//! and lightweight request statistics.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::{EngineClient, EngineError, ProductGenerator};
use crate::models::{User, UserRole};
use crate::services::analytics::AnalyticsServiceError;
use crate::services::category::CategoryServiceError;
use crate::services::checkout::CheckoutServiceError;
use crate::services::integration::IntegrationServiceError;
use crate::services::post::PostServiceError;
use crate::services::product::ProductServiceError;
use crate::services::settings::SettingsServiceError;
use crate::services::user::UserServiceError;

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<crate::config::Config>,
    pub user_service: Arc<crate::services::UserService>,
    pub category_service: Arc<crate::services::CategoryService>,
    pub product_service: Arc<crate::services::ProductService>,
    pub post_service: Arc<crate::services::PostService>,
    pub settings_service: Arc<crate::services::SettingsService>,
    pub integration_service: Arc<crate::services::IntegrationService>,
    pub checkout_service: Arc<crate::services::CheckoutService>,
    pub analytics_service: Arc<crate::services::AnalyticsService>,
    pub engine_client: Arc<EngineClient>,
    pub product_generator: Arc<ProductGenerator>,
    pub request_stats: Arc<RequestStats>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// ============================================================================
// Error envelope
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "ENGINE_TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
            "ENGINE_UNAVAILABLE" => StatusCode::BAD_GATEWAY,
            "ENGINE_FAILED" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

// Service errors carry enough structure to pick the right envelope code;
// internal details stay in the log, not the response body.

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::DuplicateUsername(_) | UserServiceError::DuplicateEmail(_) => {
                ApiError::conflict(err.to_string())
            }
            UserServiceError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            UserServiceError::InvalidSession => ApiError::unauthorized(err.to_string()),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(msg) => ApiError::not_found(msg),
            CategoryServiceError::ParentNotFound(_)
            | CategoryServiceError::ContextMismatch
            | CategoryServiceError::CircularReference
            | CategoryServiceError::TooDeep => ApiError::validation_error(err.to_string()),
            CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CategoryServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ProductServiceError> for ApiError {
    fn from(err: ProductServiceError) -> Self {
        match err {
            ProductServiceError::NotFound(msg) => ApiError::not_found(msg),
            ProductServiceError::InvalidCategory(_) => ApiError::validation_error(err.to_string()),
            ProductServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ProductServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(msg) => ApiError::not_found(msg),
            PostServiceError::InvalidCategory(_) => ApiError::validation_error(err.to_string()),
            PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PostServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(err: SettingsServiceError) -> Self {
        match err {
            SettingsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SettingsServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<IntegrationServiceError> for ApiError {
    fn from(err: IntegrationServiceError) -> Self {
        match err {
            IntegrationServiceError::Disabled(_) => ApiError::forbidden(err.to_string()),
            IntegrationServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            IntegrationServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<CheckoutServiceError> for ApiError {
    fn from(err: CheckoutServiceError) -> Self {
        match err {
            CheckoutServiceError::ProductNotFound(msg) => ApiError::not_found(msg),
            CheckoutServiceError::IntegrationDisabled(_) => ApiError::forbidden(err.to_string()),
            CheckoutServiceError::MissingConfig(..) => ApiError::validation_error(err.to_string()),
            CheckoutServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CheckoutServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<AnalyticsServiceError> for ApiError {
    fn from(err: AnalyticsServiceError) -> Self {
        match err {
            AnalyticsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AnalyticsServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Timeout => ApiError::new("ENGINE_TIMEOUT", message),
            EngineError::Connect | EngineError::Upstream { .. } => {
                ApiError::new("ENGINE_UNAVAILABLE", message)
            }
            EngineError::Failed(_) => ApiError::new("ENGINE_FAILED", message),
            EngineError::Decode(detail) => {
                tracing::error!(detail = %detail, "Engine response decode failed");
                ApiError::internal_error(message)
            }
            EngineError::Internal(e) => internal(e),
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!(error = ?err, "Internal error");
    ApiError::internal_error("Internal server error")
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract session token from request (Bearer header or session cookie)
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| match e {
            UserServiceError::InvalidSession => {
                ApiError::unauthorized("Invalid or expired session")
            }
            other => ApiError::from(other),
        })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware; runs after `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_stats_average() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);

        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }

    #[test]
    fn test_engine_error_codes() {
        let timeout = ApiError::from(EngineError::Timeout);
        assert_eq!(timeout.error.code, "ENGINE_TIMEOUT");

        let connect = ApiError::from(EngineError::Connect);
        assert_eq!(connect.error.code, "ENGINE_UNAVAILABLE");

        let upstream = ApiError::from(EngineError::Upstream { status: 500 });
        assert_eq!(upstream.error.code, "ENGINE_UNAVAILABLE");

        let failed = ApiError::from(EngineError::Failed("FAILED".to_string()));
        assert_eq!(failed.error.code, "ENGINE_FAILED");
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::from(ProductServiceError::InternalError(anyhow::anyhow!(
            "database path /secret/agrimart.db is missing"
        )));
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert!(!err.error.message.contains("/secret"));
    }
}
