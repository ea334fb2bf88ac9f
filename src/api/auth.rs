//! Auth API endpoints
//!
//! Register and login are public; me/logout/change-password sit behind the
//! auth middleware. The session token is returned in the body and also set
//! as a cookie so both SPA and server-rendered clients work.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::session::Session;
use crate::models::user::User;
use crate::services::user::RegisterInput;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Build the public auth router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build the protected auth router
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/password", post(change_password))
}

fn session_cookie(session: &Session) -> String {
    format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        Session::LIFETIME_DAYS * 24 * 60 * 60
    )
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .register(RegisterInput {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok(Json(user.into()))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (user, session) = state
        .user_service
        .login(&request.username, &request.password)
        .await?;

    let cookie = session_cookie(&session);
    let body = Json(LoginResponse {
        token: session.id,
        user: user.into(),
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// GET /api/v1/auth/me
async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<UserResponse> {
    Json(user.0.into())
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    request: axum::extract::Request,
) -> Result<Response, ApiError> {
    // The middleware has already validated the token; pull it again to
    // know which session to delete
    if let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| {
            request
                .headers()
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies
                        .split(';')
                        .map(str::trim)
                        .find_map(|c| c.strip_prefix("session="))
                        .map(str::to_string)
                })
        })
    {
        state.user_service.logout(&token).await?;
    }

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string();
    Ok((
        [(header::SET_COOKIE, clear_cookie)],
        Json(serde_json::json!({"logged_out": true})),
    )
        .into_response())
}

/// POST /api/v1/auth/password
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .user_service
        .change_password(user.0.id, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(serde_json::json!({"changed": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use chrono::Utc;

    #[test]
    fn test_user_response_has_no_password_hash() {
        let user = User {
            id: 1,
            username: "tani".to_string(),
            email: "tani@example.id".to_string(),
            password_hash: "$argon2id$rahasia".to_string(),
            role: UserRole::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value.get("role"), Some(&serde_json::json!("admin")));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let session = Session::new(1);
        let cookie = session_cookie(&session);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.starts_with(&format!("session={}", session.id)));
    }
}
