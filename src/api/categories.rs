//! Category API endpoints
//!
//! The public side serves read-only trees per context; the admin side has
//! full CRUD with the tree invariants enforced in the service.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::category::{
    Category, CategoryContext, CategoryTreeNode, CreateCategoryInput, UpdateCategoryInput,
};

#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    #[serde(default = "default_context")]
    pub context: String,
}

fn default_context() -> String {
    "product".to_string()
}

fn parse_context(s: &str) -> Result<CategoryContext, ApiError> {
    CategoryContext::parse(s)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown category context: {}", s)))
}

#[derive(Debug, Serialize)]
pub struct CategoryTreeResponse {
    pub categories: Vec<CategoryTreeNode>,
}

/// Request body for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_context")]
    pub context: String,
    pub parent_id: Option<i64>,
    pub sort_order: Option<i32>,
}

/// Request body for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "crate::api::common::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::api::common::double_option")]
    pub parent_id: Option<Option<i64>>,
    pub sort_order: Option<i32>,
}

/// Build the public categories router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(get_category_tree))
}

/// Build the admin categories router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/{id}", put(update_category))
        .route("/{id}", delete(delete_category))
}

/// GET /api/v1/categories?context=product - Category tree for a context
async fn get_category_tree(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<CategoryTreeResponse>, ApiError> {
    let context = parse_context(&query.context)?;
    let categories = state.category_service.list_tree(context).await?;
    Ok(Json(CategoryTreeResponse { categories }))
}

/// GET /api/v1/admin/categories?context=product - Flat list
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let context = parse_context(&query.context)?;
    Ok(Json(state.category_service.list(context).await?))
}

/// POST /api/v1/admin/categories
async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let context = parse_context(&request.context)?;
    let input = CreateCategoryInput {
        name: request.name,
        slug: request.slug,
        description: request.description,
        context,
        parent_id: request.parent_id,
        sort_order: request.sort_order,
    };

    Ok(Json(state.category_service.create(input).await?))
}

/// PUT /api/v1/admin/categories/{id}
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let input = UpdateCategoryInput {
        name: request.name,
        slug: request.slug,
        description: request.description,
        parent_id: request.parent_id,
        sort_order: request.sort_order,
    };

    Ok(Json(state.category_service.update(id, input).await?))
}

/// DELETE /api/v1/admin/categories/{id}
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.category_service.delete(id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
