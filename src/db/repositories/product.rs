//! Product repository
//!
//! JSON columns (wholesale_prices, attributes, images) are serialized at
//! this boundary so the rest of the crate works with typed values.

use crate::models::product::{Product, ProductEngine, ProductImage, ProductStatus, WholesaleTier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Product repository trait
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a new product
    async fn create(&self, product: &Product) -> Result<Product>;

    /// Get product by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// Get product by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>>;

    /// List all products (admin view)
    async fn list(&self) -> Result<Vec<Product>>;

    /// List products with a given status
    async fn list_by_status(&self, status: ProductStatus) -> Result<Vec<Product>>;

    /// List products in a category
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>>;

    /// Update a product
    async fn update(&self, product: &Product) -> Result<Product>;

    /// Delete a product
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Move all products from one category to another
    async fn move_category(&self, from: i64, to: Option<i64>) -> Result<u64>;
}

/// SQLx-based product repository implementation
pub struct SqlxProductRepository {
    pool: SqlitePool,
}

impl SqlxProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ProductRepository> {
        Arc::new(Self::new(pool))
    }
}

const PRODUCT_COLUMNS: &str = "id, slug, name, description, category_id, price, wholesale_prices, \
     attributes, status, engine, seo_keywords, images, created_at, updated_at";

#[async_trait]
impl ProductRepository for SqlxProductRepository {
    async fn create(&self, product: &Product) -> Result<Product> {
        let now = Utc::now();
        let wholesale = serde_json::to_string(&product.wholesale_prices)
            .context("Failed to serialize wholesale prices")?;
        let attributes = serde_json::to_string(&product.attributes)
            .context("Failed to serialize attributes")?;
        let images =
            serde_json::to_string(&product.images).context("Failed to serialize images")?;

        let result = sqlx::query(
            r#"
            INSERT INTO products
                (slug, name, description, category_id, price, wholesale_prices,
                 attributes, status, engine, seo_keywords, images, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.price)
        .bind(&wholesale)
        .bind(&attributes)
        .bind(product.status.as_str())
        .bind(product.engine.as_str())
        .bind(&product.seo_keywords)
        .bind(&images)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create product")?;

        Ok(Product {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..product.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get product by ID")?;

        row.map(|row| row_to_product(&row)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get product by slug")?;

        row.map(|row| row_to_product(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_by_status(&self, status: ProductStatus) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = ? ORDER BY created_at DESC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products by status")?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ? ORDER BY created_at DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products by category")?;

        rows.iter().map(row_to_product).collect()
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let wholesale = serde_json::to_string(&product.wholesale_prices)
            .context("Failed to serialize wholesale prices")?;
        let attributes = serde_json::to_string(&product.attributes)
            .context("Failed to serialize attributes")?;
        let images =
            serde_json::to_string(&product.images).context("Failed to serialize images")?;

        sqlx::query(
            r#"
            UPDATE products
            SET slug = ?, name = ?, description = ?, category_id = ?, price = ?,
                wholesale_prices = ?, attributes = ?, status = ?, engine = ?,
                seo_keywords = ?, images = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.price)
        .bind(&wholesale)
        .bind(&attributes)
        .bind(product.status.as_str())
        .bind(product.engine.as_str())
        .bind(&product.seo_keywords)
        .bind(&images)
        .bind(product.id)
        .execute(&self.pool)
        .await
        .context("Failed to update product")?;

        self.get_by_id(product.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete product")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM products WHERE slug = ? LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check product slug")?;
        Ok(row.is_some())
    }

    async fn move_category(&self, from: i64, to: Option<i64>) -> Result<u64> {
        let result = sqlx::query("UPDATE products SET category_id = ? WHERE category_id = ?")
            .bind(to)
            .bind(from)
            .execute(&self.pool)
            .await
            .context("Failed to move products between categories")?;
        Ok(result.rows_affected())
    }
}

/// Map a database row to a Product
fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    let status_str: String = row.get("status");
    let status = ProductStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown product status: {}", status_str))?;

    let engine_str: String = row.get("engine");
    let engine = ProductEngine::parse(&engine_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown product engine: {}", engine_str))?;

    let wholesale_json: String = row.get("wholesale_prices");
    let wholesale_prices: Vec<WholesaleTier> = serde_json::from_str(&wholesale_json)
        .context("Failed to deserialize wholesale prices")?;

    let attributes_json: String = row.get("attributes");
    let attributes: serde_json::Value =
        serde_json::from_str(&attributes_json).context("Failed to deserialize attributes")?;

    let images_json: String = row.get("images");
    let images: Vec<ProductImage> =
        serde_json::from_str(&images_json).context("Failed to deserialize images")?;

    Ok(Product {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        price: row.get("price"),
        wholesale_prices,
        attributes,
        status,
        engine,
        seo_keywords: row.get("seo_keywords"),
        images,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;

    async fn setup() -> SqlxProductRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SqlxProductRepository::new(pool)
    }

    fn product(slug: &str, status: ProductStatus) -> Product {
        Product {
            id: 0,
            slug: slug.to_string(),
            name: slug.to_string(),
            description: "<p>Deskripsi produk.</p>".to_string(),
            category_id: None,
            price: 50_000,
            wholesale_prices: vec![WholesaleTier {
                min_qty: 10,
                price: 45_000,
            }],
            attributes: serde_json::json!({"berat": "1kg"}),
            status,
            engine: ProductEngine::Manual,
            seo_keywords: "produk tani".to_string(),
            images: vec![ProductImage {
                url: "/images/produk.jpg".to_string(),
                role: Some("hero".to_string()),
                alt: None,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrips_json_fields() {
        let repo = setup().await;

        let created = repo
            .create(&product("beras-organik", ProductStatus::Active))
            .await
            .unwrap();

        let fetched = repo.get_by_slug("beras-organik").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.wholesale_prices.len(), 1);
        assert_eq!(fetched.wholesale_prices[0].price, 45_000);
        assert_eq!(fetched.attributes["berat"], "1kg");
        assert_eq!(fetched.images[0].role.as_deref(), Some("hero"));
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let repo = setup().await;

        repo.create(&product("aktif", ProductStatus::Active))
            .await
            .unwrap();
        repo.create(&product("draf", ProductStatus::Draft))
            .await
            .unwrap();

        let active = repo.list_by_status(ProductStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].slug, "aktif");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update() {
        let repo = setup().await;

        let mut created = repo
            .create(&product("pupuk-npk", ProductStatus::Draft))
            .await
            .unwrap();
        created.price = 99_000;
        created.status = ProductStatus::Active;

        let updated = repo.update(&created).await.unwrap();
        assert_eq!(updated.price, 99_000);
        assert_eq!(updated.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let repo = setup().await;

        let created = repo
            .create(&product("benih-jagung", ProductStatus::Draft))
            .await
            .unwrap();
        assert!(repo.exists_by_slug("benih-jagung").await.unwrap());

        repo.delete(created.id).await.unwrap();
        assert!(!repo.exists_by_slug("benih-jagung").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_category() {
        let repo = setup().await;

        let categories =
            super::super::category::SqlxCategoryRepository::new(repo.pool.clone());
        let from = crate::db::repositories::CategoryRepository::create(
            &categories,
            &crate::models::Category::new(
                "lama".to_string(),
                "Lama".to_string(),
                crate::models::CategoryContext::Product,
                None,
                0,
            ),
        )
        .await
        .unwrap();

        let mut p = product("item", ProductStatus::Active);
        p.category_id = Some(from.id);
        let created = repo.create(&p).await.unwrap();

        let moved = repo.move_category(from.id, None).await.unwrap();
        assert_eq!(moved, 1);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category_id, None);
    }
}
