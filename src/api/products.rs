//! Product API endpoints
//!
//! Public storefront routes expose a trimmed DTO: a single resolved price
//! and no merchandising internals. Admin routes work with the full model.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::category::CategoryContext;
use crate::models::product::{
    CreateProductInput, Product, ProductEngine, ProductImage, ProductStatus, UpdateProductInput,
    WholesaleTier,
};

/// Public product representation.
///
/// Deliberately omits `status`, `engine`, `wholesale_prices`, and
/// `attributes`; the storefront sees one price and nothing about how the
/// listing was produced.
#[derive(Debug, Serialize)]
pub struct PublicProduct {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub price: i64,
    pub seo_keywords: String,
    pub images: Vec<ProductImage>,
}

impl From<Product> for PublicProduct {
    fn from(product: Product) -> Self {
        Self {
            slug: product.slug,
            name: product.name,
            description: product.description,
            category_id: product.category_id,
            price: product.price,
            seo_keywords: product.seo_keywords,
            images: product.images,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PublicListQuery {
    /// Category slug to filter by
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicProductListResponse {
    pub products: Vec<PublicProduct>,
}

/// Request body for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<i64>,
    pub price: i64,
    #[serde(default)]
    pub wholesale_prices: Vec<WholesaleTier>,
    #[serde(default = "default_attributes")]
    pub attributes: serde_json::Value,
    #[serde(default = "default_status")]
    pub status: ProductStatus,
    #[serde(default)]
    pub seo_keywords: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

fn default_attributes() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

fn default_status() -> ProductStatus {
    ProductStatus::Draft
}

/// Request body for updating a product; absent fields stay untouched
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    /// `null` clears the category, absence leaves it alone
    #[serde(default, deserialize_with = "crate::api::common::double_option")]
    pub category_id: Option<Option<i64>>,
    pub price: Option<i64>,
    pub wholesale_prices: Option<Vec<WholesaleTier>>,
    pub attributes: Option<serde_json::Value>,
    pub status: Option<ProductStatus>,
    pub seo_keywords: Option<String>,
    pub images: Option<Vec<ProductImage>>,
}

/// Build the public products router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public_products))
        .route("/{slug}", get(get_public_product))
}

/// Build the admin products router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admin_products))
        .route("/", post(create_product))
        .route("/{id}", get(get_admin_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

/// GET /api/v1/products - List active products
async fn list_public_products(
    State(state): State<AppState>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<PublicProductListResponse>, ApiError> {
    let category_id = match query.category {
        Some(ref slug) => {
            let category = state
                .category_service
                .get_by_slug(CategoryContext::Product, slug)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", slug)))?;
            Some(category.id)
        }
        None => None,
    };

    let products = state.product_service.list_public(category_id).await?;

    Ok(Json(PublicProductListResponse {
        products: products.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/products/{slug} - Get one active product
async fn get_public_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicProduct>, ApiError> {
    let product = state
        .product_service
        .get_public(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", slug)))?;

    Ok(Json(product.into()))
}

/// GET /api/v1/admin/products - List all products
async fn list_admin_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.product_service.list().await?))
}

/// GET /api/v1/admin/products/{id}
async fn get_admin_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .product_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;
    Ok(Json(product))
}

/// POST /api/v1/admin/products
async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let input = CreateProductInput {
        name: request.name,
        slug: request.slug,
        description: request.description,
        category_id: request.category_id,
        price: request.price,
        wholesale_prices: request.wholesale_prices,
        attributes: request.attributes,
        status: request.status,
        engine: ProductEngine::Manual,
        seo_keywords: request.seo_keywords,
        images: request.images,
    };

    Ok(Json(state.product_service.create(input).await?))
}

/// PUT /api/v1/admin/products/{id}
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let input = UpdateProductInput {
        name: request.name,
        slug: request.slug,
        description: request.description,
        category_id: request.category_id,
        price: request.price,
        wholesale_prices: request.wholesale_prices,
        attributes: request.attributes,
        status: request.status,
        seo_keywords: request.seo_keywords,
        images: request.images,
    };

    Ok(Json(state.product_service.update(id, input).await?))
}

/// DELETE /api/v1/admin/products/{id}
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.product_service.delete(id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_public_dto_omits_internal_fields() {
        let product = Product {
            id: 7,
            slug: "beras".to_string(),
            name: "Beras".to_string(),
            description: "<p>Enak.</p>".to_string(),
            category_id: Some(1),
            price: 85_000,
            wholesale_prices: vec![WholesaleTier {
                min_qty: 10,
                price: 78_000,
            }],
            attributes: serde_json::json!({"supplier": "internal"}),
            status: ProductStatus::Active,
            engine: ProductEngine::Generated,
            seo_keywords: "beras".to_string(),
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(PublicProduct::from(product)).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.get("status").is_none());
        assert!(object.get("engine").is_none());
        assert!(object.get("wholesale_prices").is_none());
        assert!(object.get("attributes").is_none());
        assert_eq!(object.get("price"), Some(&serde_json::json!(85_000)));
    }
}
