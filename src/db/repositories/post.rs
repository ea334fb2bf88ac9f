//! Blog post repository

use crate::models::post::{Post, PostStatus};
use crate::models::product::ProductEngine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// List all posts (admin view)
    async fn list(&self) -> Result<Vec<Post>>;

    /// List published posts, newest first
    async fn list_published(&self) -> Result<Vec<Post>>;

    /// Update a post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Move all posts from one category to another
    async fn move_category(&self, from: i64, to: Option<i64>) -> Result<u64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const POST_COLUMNS: &str =
    "id, slug, title, body, category_id, status, engine, published_at, created_at, updated_at";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO posts
                (slug, title, body, category_id, status, engine, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.category_id)
        .bind(post.status.as_str())
        .bind(post.engine.as_str())
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(Post {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..post.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;

        row.map(|row| row_to_post(&row)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by slug")?;

        row.map(|row| row_to_post(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts")?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_published(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE status = 'published' \
             ORDER BY published_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list published posts")?;

        rows.iter().map(row_to_post).collect()
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        sqlx::query(
            r#"
            UPDATE posts
            SET slug = ?, title = ?, body = ?, category_id = ?, status = ?,
                published_at = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.category_id)
        .bind(post.status.as_str())
        .bind(post.published_at)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM posts WHERE slug = ? LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check post slug")?;
        Ok(row.is_some())
    }

    async fn move_category(&self, from: i64, to: Option<i64>) -> Result<u64> {
        let result = sqlx::query("UPDATE posts SET category_id = ? WHERE category_id = ?")
            .bind(to)
            .bind(from)
            .execute(&self.pool)
            .await
            .context("Failed to move posts between categories")?;
        Ok(result.rows_affected())
    }
}

/// Map a database row to a Post
fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = PostStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown post status: {}", status_str))?;

    let engine_str: String = row.get("engine");
    let engine = ProductEngine::parse(&engine_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown post engine: {}", engine_str))?;

    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        category_id: row.get("category_id"),
        status,
        engine,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;

    async fn setup() -> SqlxPostRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SqlxPostRepository::new(pool)
    }

    fn post(slug: &str, status: PostStatus) -> Post {
        Post {
            id: 0,
            slug: slug.to_string(),
            title: slug.to_string(),
            body: "<p>Isi artikel.</p>".to_string(),
            category_id: None,
            status,
            engine: ProductEngine::Manual,
            published_at: (status == PostStatus::Published).then(Utc::now),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let created = repo
            .create(&post("cara-menanam-padi", PostStatus::Published))
            .await
            .unwrap();
        assert!(created.id > 0);

        let fetched = repo
            .get_by_slug("cara-menanam-padi")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "cara-menanam-padi");
        assert!(fetched.published_at.is_some());
    }

    #[tokio::test]
    async fn test_list_published_excludes_drafts() {
        let repo = setup().await;

        repo.create(&post("terbit", PostStatus::Published))
            .await
            .unwrap();
        repo.create(&post("draf", PostStatus::Draft)).await.unwrap();

        let published = repo.list_published().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "terbit");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_publishes() {
        let repo = setup().await;

        let mut created = repo.create(&post("draf", PostStatus::Draft)).await.unwrap();
        created.status = PostStatus::Published;
        created.published_at = Some(Utc::now());

        let updated = repo.update(&created).await.unwrap();
        assert_eq!(updated.status, PostStatus::Published);
        assert!(updated.published_at.is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;

        let created = repo.create(&post("hapus", PostStatus::Draft)).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
