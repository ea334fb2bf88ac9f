//! Category repository
//!
//! Database operations for context-tagged category trees.

use crate::models::category::{Category, CategoryContext, CategoryTreeNode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug within a context
    async fn get_by_slug(&self, context: CategoryContext, slug: &str) -> Result<Option<Category>>;

    /// List all categories in a context (flat list)
    async fn list(&self, context: CategoryContext) -> Result<Vec<Category>>;

    /// List a context's categories as a tree
    async fn list_tree(&self, context: CategoryContext) -> Result<Vec<CategoryTreeNode>>;

    /// Get direct children of a category
    async fn get_children(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// Get IDs of a category and all its descendants
    async fn get_all_descendants(&self, id: i64) -> Result<Vec<i64>>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists within a context
    async fn exists_by_slug(&self, context: CategoryContext, slug: &str) -> Result<bool>;

    /// Re-parent all direct children of a category
    async fn reparent_children(&self, from: i64, to: Option<i64>) -> Result<u64>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const CATEGORY_COLUMNS: &str =
    "id, slug, name, description, context, parent_id, sort_order, created_at";

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO categories (slug, name, description, context, parent_id, sort_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.context.as_str())
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create category")?;

        Ok(Category {
            id: result.last_insert_rowid(),
            created_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by ID")?;

        row.map(|row| row_to_category(&row)).transpose()
    }

    async fn get_by_slug(&self, context: CategoryContext, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE context = ? AND slug = ?"
        ))
        .bind(context.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by slug")?;

        row.map(|row| row_to_category(&row)).transpose()
    }

    async fn list(&self, context: CategoryContext) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE context = ? ORDER BY sort_order, name"
        ))
        .bind(context.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn list_tree(&self, context: CategoryContext) -> Result<Vec<CategoryTreeNode>> {
        // Fetch flat and assemble the tree in the application layer
        let categories = self.list(context).await?;
        Ok(build_category_tree(categories))
    }

    async fn get_children(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id = ? ORDER BY sort_order, name"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get child categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn get_all_descendants(&self, id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE descendants AS (
                SELECT id FROM categories WHERE id = ?
                UNION ALL
                SELECT c.id
                FROM categories c
                INNER JOIN descendants d ON c.parent_id = d.id
            )
            SELECT id FROM descendants
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get category descendants")?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        sqlx::query(
            r#"
            UPDATE categories
            SET slug = ?, name = ?, description = ?, parent_id = ?, sort_order = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.id)
        .execute(&self.pool)
        .await
        .context("Failed to update category")?;

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;
        Ok(())
    }

    async fn exists_by_slug(&self, context: CategoryContext, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM categories WHERE context = ? AND slug = ? LIMIT 1")
            .bind(context.as_str())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check category slug")?;
        Ok(row.is_some())
    }

    async fn reparent_children(&self, from: i64, to: Option<i64>) -> Result<u64> {
        let result = sqlx::query("UPDATE categories SET parent_id = ? WHERE parent_id = ?")
            .bind(to)
            .bind(from)
            .execute(&self.pool)
            .await
            .context("Failed to re-parent child categories")?;
        Ok(result.rows_affected())
    }
}

/// Map a database row to a Category
fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    let context_str: String = row.get("context");
    let context = CategoryContext::parse(&context_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown category context: {}", context_str))?;

    Ok(Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        context,
        parent_id: row.get("parent_id"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
    })
}

/// Build a category tree from a flat list
fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryTreeNode> {
    let mut category_map: HashMap<i64, Category> = HashMap::new();
    for cat in categories {
        category_map.insert(cat.id, cat);
    }

    let mut children_map: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
    for (id, cat) in &category_map {
        // Orphans (parent outside this context or deleted) surface as roots
        let parent = cat
            .parent_id
            .filter(|pid| category_map.contains_key(pid));
        children_map.entry(parent).or_default().push(*id);
    }

    for children in children_map.values_mut() {
        children.sort_by_key(|id| {
            let cat = &category_map[id];
            (cat.sort_order, cat.name.clone())
        });
    }

    fn build_subtree(
        parent_id: Option<i64>,
        category_map: &HashMap<i64, Category>,
        children_map: &HashMap<Option<i64>, Vec<i64>>,
    ) -> Vec<CategoryTreeNode> {
        let Some(child_ids) = children_map.get(&parent_id) else {
            return Vec::new();
        };

        child_ids
            .iter()
            .filter_map(|id| {
                let category = category_map.get(id)?.clone();
                let children = build_subtree(Some(*id), category_map, children_map);
                Some(CategoryTreeNode::with_children(category, children))
            })
            .collect()
    }

    build_subtree(None, &category_map, &children_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;

    async fn setup() -> SqlxCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SqlxCategoryRepository::new(pool)
    }

    fn category(slug: &str, context: CategoryContext, parent_id: Option<i64>) -> Category {
        Category::new(slug.to_string(), slug.to_string(), context, parent_id, 0)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let created = repo
            .create(&category("pupuk", CategoryContext::Product, None))
            .await
            .unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "pupuk");
        assert_eq!(by_id.context, CategoryContext::Product);

        let by_slug = repo
            .get_by_slug(CategoryContext::Product, "pupuk")
            .await
            .unwrap();
        assert!(by_slug.is_some());
    }

    #[tokio::test]
    async fn test_slug_unique_per_context() {
        let repo = setup().await;

        repo.create(&category("pupuk", CategoryContext::Product, None))
            .await
            .unwrap();
        // Same slug in a different context is allowed
        repo.create(&category("pupuk", CategoryContext::Blog, None))
            .await
            .unwrap();

        assert!(repo
            .exists_by_slug(CategoryContext::Product, "pupuk")
            .await
            .unwrap());
        assert!(repo
            .exists_by_slug(CategoryContext::Blog, "pupuk")
            .await
            .unwrap());
        assert!(!repo
            .exists_by_slug(CategoryContext::Ai, "pupuk")
            .await
            .unwrap());

        // Duplicate within a context violates the unique constraint
        let dup = repo
            .create(&category("pupuk", CategoryContext::Product, None))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_list_scoped_by_context() {
        let repo = setup().await;

        repo.create(&category("pupuk", CategoryContext::Product, None))
            .await
            .unwrap();
        repo.create(&category("tips", CategoryContext::Blog, None))
            .await
            .unwrap();

        let products = repo.list(CategoryContext::Product).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].slug, "pupuk");

        let blogs = repo.list(CategoryContext::Blog).await.unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].slug, "tips");
    }

    #[tokio::test]
    async fn test_descendants_cte() {
        let repo = setup().await;

        let root = repo
            .create(&category("benih", CategoryContext::Product, None))
            .await
            .unwrap();
        let child = repo
            .create(&category("benih-padi", CategoryContext::Product, Some(root.id)))
            .await
            .unwrap();
        let grandchild = repo
            .create(&category(
                "benih-padi-hibrida",
                CategoryContext::Product,
                Some(child.id),
            ))
            .await
            .unwrap();

        let mut descendants = repo.get_all_descendants(root.id).await.unwrap();
        descendants.sort();
        assert_eq!(descendants, vec![root.id, child.id, grandchild.id]);
    }

    #[tokio::test]
    async fn test_tree_building() {
        let repo = setup().await;

        let root = repo
            .create(&category("alat", CategoryContext::Product, None))
            .await
            .unwrap();
        repo.create(&category("cangkul", CategoryContext::Product, Some(root.id)))
            .await
            .unwrap();
        repo.create(&category("traktor", CategoryContext::Product, Some(root.id)))
            .await
            .unwrap();

        let tree = repo.list_tree(CategoryContext::Product).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.slug, "alat");
        assert_eq!(tree[0].children.len(), 2);
    }

    #[tokio::test]
    async fn test_reparent_children() {
        let repo = setup().await;

        let root = repo
            .create(&category("alat", CategoryContext::Product, None))
            .await
            .unwrap();
        let mid = repo
            .create(&category("mesin", CategoryContext::Product, Some(root.id)))
            .await
            .unwrap();
        let leaf = repo
            .create(&category("traktor", CategoryContext::Product, Some(mid.id)))
            .await
            .unwrap();

        let moved = repo
            .reparent_children(mid.id, Some(root.id))
            .await
            .unwrap();
        assert_eq!(moved, 1);

        let leaf = repo.get_by_id(leaf.id).await.unwrap().unwrap();
        assert_eq!(leaf.parent_id, Some(root.id));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;

        let created = repo
            .create(&category("obat", CategoryContext::Product, None))
            .await
            .unwrap();
        repo.delete(created.id).await.unwrap();

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
