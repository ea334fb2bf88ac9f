//! Product service
//!
//! CRUD for the catalog plus the public storefront view. Public listings
//! only ever contain active products; draft and archived products stay in
//! the admin surface.

use crate::cache::{CacheLayer, SharedCache};
use crate::db::repositories::{CategoryRepository, ProductRepository};
use crate::models::category::CategoryContext;
use crate::models::product::{CreateProductInput, Product, ProductStatus, UpdateProductInput};
use crate::services::slug::{ensure_unique_slug, generate_slug};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for product reads (10 minutes; the catalog changes more often
/// than the category tree)
const PRODUCT_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_PRODUCT_SLUG: &str = "products:slug:";
const CACHE_KEY_PUBLIC_LIST: &str = "products:public";

/// Error types for product service operations
#[derive(Debug, thiserror::Error)]
pub enum ProductServiceError {
    /// Product not found
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Category not found or not a product category
    #[error("Invalid category: {0}")]
    InvalidCategory(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Product service
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    cache: SharedCache,
    cache_ttl: Duration,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
        cache: SharedCache,
    ) -> Self {
        Self {
            repo,
            categories,
            cache,
            cache_ttl: Duration::from_secs(PRODUCT_CACHE_TTL_SECS),
        }
    }

    /// Create a product.
    pub async fn create(&self, input: CreateProductInput) -> Result<Product, ProductServiceError> {
        if input.name.trim().is_empty() {
            return Err(ProductServiceError::ValidationError(
                "Product name cannot be empty".to_string(),
            ));
        }
        if input.price < 0 {
            return Err(ProductServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        if let Some(category_id) = input.category_id {
            self.validate_category(category_id).await?;
        }

        let base = input
            .slug
            .as_deref()
            .map(generate_slug)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));

        let repo = self.repo.clone();
        let slug = ensure_unique_slug(&base, move |candidate| {
            let repo = repo.clone();
            async move { repo.exists_by_slug(&candidate).await }
        })
        .await?;

        let now = Utc::now();
        let product = Product {
            id: 0,
            slug,
            name: input.name,
            description: input.description,
            category_id: input.category_id,
            price: input.price,
            wholesale_prices: input.wholesale_prices,
            attributes: input.attributes,
            status: input.status,
            engine: input.engine,
            seo_keywords: input.seo_keywords,
            images: input.images,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&product)
            .await
            .context("Failed to create product")?;

        self.invalidate_cache().await;

        tracing::info!(slug = %created.slug, "Product created");

        Ok(created)
    }

    /// Get a product by ID (admin view, all statuses)
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>, ProductServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get product by ID")
            .map_err(Into::into)
    }

    /// Get a product by slug (admin view, all statuses)
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, ProductServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_PRODUCT_SLUG, slug);
        if let Some(product) = self.cache.get::<Product>(&cache_key).await.ok().flatten() {
            return Ok(Some(product));
        }

        let product = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get product by slug")?;

        if let Some(ref p) = product {
            let _ = self.cache.set(&cache_key, p, self.cache_ttl).await;
        }

        Ok(product)
    }

    /// Get an active product by slug, for the public storefront.
    pub async fn get_public(&self, slug: &str) -> Result<Option<Product>, ProductServiceError> {
        Ok(self.get_by_slug(slug).await?.filter(Product::is_public))
    }

    /// List all products (admin view)
    pub async fn list(&self) -> Result<Vec<Product>, ProductServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list products")
            .map_err(Into::into)
    }

    /// List active products, optionally filtered by category, for the
    /// public storefront.
    pub async fn list_public(
        &self,
        category_id: Option<i64>,
    ) -> Result<Vec<Product>, ProductServiceError> {
        if let Some(category_id) = category_id {
            let products = self
                .repo
                .list_by_category(category_id)
                .await
                .context("Failed to list products by category")?;
            return Ok(products.into_iter().filter(Product::is_public).collect());
        }

        if let Some(list) = self
            .cache
            .get::<Vec<Product>>(CACHE_KEY_PUBLIC_LIST)
            .await
            .ok()
            .flatten()
        {
            return Ok(list);
        }

        let list = self
            .repo
            .list_by_status(ProductStatus::Active)
            .await
            .context("Failed to list active products")?;

        let _ = self
            .cache
            .set(CACHE_KEY_PUBLIC_LIST, &list, self.cache_ttl)
            .await;

        Ok(list)
    }

    /// Update a product.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProductInput,
    ) -> Result<Product, ProductServiceError> {
        let mut product = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get product")?
            .ok_or_else(|| {
                ProductServiceError::NotFound(format!("Product with ID {} not found", id))
            })?;

        if let Some(ref name) = input.name {
            if name.trim().is_empty() {
                return Err(ProductServiceError::ValidationError(
                    "Product name cannot be empty".to_string(),
                ));
            }
            product.name = name.clone();
        }

        if let Some(ref new_slug) = input.slug {
            let base = generate_slug(new_slug);
            if base != product.slug {
                let repo = self.repo.clone();
                product.slug = ensure_unique_slug(&base, move |candidate| {
                    let repo = repo.clone();
                    async move { repo.exists_by_slug(&candidate).await }
                })
                .await?;
            }
        }

        if let Some(description) = input.description {
            product.description = description;
        }
        if let Some(category_id) = input.category_id {
            if let Some(cid) = category_id {
                self.validate_category(cid).await?;
            }
            product.category_id = category_id;
        }
        if let Some(price) = input.price {
            if price < 0 {
                return Err(ProductServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
            product.price = price;
        }
        if let Some(wholesale_prices) = input.wholesale_prices {
            product.wholesale_prices = wholesale_prices;
        }
        if let Some(attributes) = input.attributes {
            product.attributes = attributes;
        }
        if let Some(status) = input.status {
            product.status = status;
        }
        if let Some(seo_keywords) = input.seo_keywords {
            product.seo_keywords = seo_keywords;
        }
        if let Some(images) = input.images {
            product.images = images;
        }

        product.updated_at = Utc::now();

        let updated = self
            .repo
            .update(&product)
            .await
            .context("Failed to update product")?;

        self.invalidate_cache().await;

        Ok(updated)
    }

    /// Delete a product.
    pub async fn delete(&self, id: i64) -> Result<(), ProductServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get product")?;
        if existing.is_none() {
            return Err(ProductServiceError::NotFound(format!(
                "Product with ID {} not found",
                id
            )));
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete product")?;

        self.invalidate_cache().await;

        Ok(())
    }

    async fn validate_category(&self, category_id: i64) -> Result<(), ProductServiceError> {
        let category = self
            .categories
            .get_by_id(category_id)
            .await
            .context("Failed to look up category")?;

        match category {
            Some(c) if c.context == CategoryContext::Product => Ok(()),
            _ => Err(ProductServiceError::InvalidCategory(category_id)),
        }
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("products:*").await;
    }
}
