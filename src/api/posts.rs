//! Blog post API endpoints
//!
//! Public routes serve published posts only; the `engine` provenance field
//! never leaves the admin surface.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::post::{CreatePostInput, Post, PostStatus, UpdatePostInput};
use crate::models::product::ProductEngine;

/// Public post representation
#[derive(Debug, Serialize)]
pub struct PublicPost {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub category_id: Option<i64>,
    pub published_at: Option<String>,
}

impl From<Post> for PublicPost {
    fn from(post: Post) -> Self {
        Self {
            slug: post.slug,
            title: post.title,
            body: post.body,
            category_id: post.category_id,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicPostListResponse {
    pub posts: Vec<PublicPost>,
}

/// Request body for creating a post
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    pub category_id: Option<i64>,
    #[serde(default = "default_status")]
    pub status: PostStatus,
}

fn default_status() -> PostStatus {
    PostStatus::Draft
}

/// Request body for updating a post
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "crate::api::common::double_option")]
    pub category_id: Option<Option<i64>>,
    pub status: Option<PostStatus>,
}

/// Build the public posts router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public_posts))
        .route("/{slug}", get(get_public_post))
}

/// Build the admin posts router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admin_posts))
        .route("/", post(create_post))
        .route("/{id}", get(get_admin_post))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
}

/// GET /api/v1/posts - List published posts, newest first
async fn list_public_posts(
    State(state): State<AppState>,
) -> Result<Json<PublicPostListResponse>, ApiError> {
    let posts = state.post_service.list_published().await?;
    Ok(Json(PublicPostListResponse {
        posts: posts.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/posts/{slug} - Get one published post
async fn get_public_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicPost>, ApiError> {
    let post = state
        .post_service
        .get_public(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", slug)))?;
    Ok(Json(post.into()))
}

/// GET /api/v1/admin/posts
async fn list_admin_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.post_service.list().await?))
}

/// GET /api/v1/admin/posts/{id}
async fn get_admin_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .post_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", id)))?;
    Ok(Json(post))
}

/// POST /api/v1/admin/posts
async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let input = CreatePostInput {
        title: request.title,
        slug: request.slug,
        body: request.body,
        category_id: request.category_id,
        status: request.status,
        engine: ProductEngine::Manual,
    };

    Ok(Json(state.post_service.create(input).await?))
}

/// PUT /api/v1/admin/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let input = UpdatePostInput {
        title: request.title,
        slug: request.slug,
        body: request.body,
        category_id: request.category_id,
        status: request.status,
    };

    Ok(Json(state.post_service.update(id, input).await?))
}

/// DELETE /api/v1/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.post_service.delete(id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_public_dto_omits_engine_and_status() {
        let post = Post {
            id: 1,
            slug: "cara-menanam".to_string(),
            title: "Cara Menanam".to_string(),
            body: "<p>Isi.</p>".to_string(),
            category_id: None,
            status: PostStatus::Published,
            engine: ProductEngine::Generated,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(PublicPost::from(post)).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.get("engine").is_none());
        assert!(object.get("status").is_none());
        assert!(object.get("published_at").is_some());
    }
}
