//! Blog post service
//!
//! CRUD for posts. Publishing stamps `published_at` the first time a post
//! goes live; re-publishing keeps the original date.

use crate::cache::{CacheLayer, SharedCache};
use crate::db::repositories::{CategoryRepository, PostRepository};
use crate::models::category::CategoryContext;
use crate::models::post::{CreatePostInput, Post, PostStatus, UpdatePostInput};
use crate::services::slug::{ensure_unique_slug, generate_slug};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

const POST_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_POST_SLUG: &str = "posts:slug:";
const CACHE_KEY_PUBLISHED_LIST: &str = "posts:published";

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Category not found or not a blog category
    #[error("Invalid category: {0}")]
    InvalidCategory(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    cache: SharedCache,
    cache_ttl: Duration,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        cache: SharedCache,
    ) -> Self {
        Self {
            repo,
            categories,
            cache,
            cache_ttl: Duration::from_secs(POST_CACHE_TTL_SECS),
        }
    }

    /// Create a post.
    pub async fn create(&self, input: CreatePostInput) -> Result<Post, PostServiceError> {
        if input.title.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Post title cannot be empty".to_string(),
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
            .unwrap_or_else(|| generate_slug(&input.title));

        let repo = self.repo.clone();
        let slug = ensure_unique_slug(&base, move |candidate| {
            let repo = repo.clone();
            async move { repo.exists_by_slug(&candidate).await }
        })
        .await?;

        let now = Utc::now();
        let post = Post {
            id: 0,
            slug,
            title: input.title,
            body: input.body,
            category_id: input.category_id,
            status: input.status,
            engine: input.engine,
            published_at: (input.status == PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&post)
            .await
            .context("Failed to create post")?;

        self.invalidate_cache().await;

        Ok(created)
    }

    /// Get a post by ID (admin view)
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")
            .map_err(Into::into)
    }

    /// Get a post by slug (admin view)
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_POST_SLUG, slug);
        if let Some(post) = self.cache.get::<Post>(&cache_key).await.ok().flatten() {
            return Ok(Some(post));
        }

        let post = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get post by slug")?;

        if let Some(ref p) = post {
            let _ = self.cache.set(&cache_key, p, self.cache_ttl).await;
        }

        Ok(post)
    }

    /// Get a published post by slug, for the public storefront.
    pub async fn get_public(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        Ok(self.get_by_slug(slug).await?.filter(Post::is_public))
    }

    /// List all posts (admin view)
    pub async fn list(&self) -> Result<Vec<Post>, PostServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list posts")
            .map_err(Into::into)
    }

    /// List published posts, newest first.
    pub async fn list_published(&self) -> Result<Vec<Post>, PostServiceError> {
        if let Some(list) = self
            .cache
            .get::<Vec<Post>>(CACHE_KEY_PUBLISHED_LIST)
            .await
            .ok()
            .flatten()
        {
            return Ok(list);
        }

        let list = self
            .repo
            .list_published()
            .await
            .context("Failed to list published posts")?;

        let _ = self
            .cache
            .set(CACHE_KEY_PUBLISHED_LIST, &list, self.cache_ttl)
            .await;

        Ok(list)
    }

    /// Update a post.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        let mut post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("Post with ID {} not found", id)))?;

        if let Some(ref title) = input.title {
            if title.trim().is_empty() {
                return Err(PostServiceError::ValidationError(
                    "Post title cannot be empty".to_string(),
                ));
            }
            post.title = title.clone();
        }

        if let Some(ref new_slug) = input.slug {
            let base = generate_slug(new_slug);
            if base != post.slug {
                let repo = self.repo.clone();
                post.slug = ensure_unique_slug(&base, move |candidate| {
                    let repo = repo.clone();
                    async move { repo.exists_by_slug(&candidate).await }
                })
                .await?;
            }
        }

        if let Some(body) = input.body {
            post.body = body;
        }
        if let Some(category_id) = input.category_id {
            if let Some(cid) = category_id {
                self.validate_category(cid).await?;
            }
            post.category_id = category_id;
        }
        if let Some(status) = input.status {
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }

        post.updated_at = Utc::now();

        let updated = self
            .repo
            .update(&post)
            .await
            .context("Failed to update post")?;

        self.invalidate_cache().await;

        Ok(updated)
    }

    /// Delete a post.
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let existing = self.repo.get_by_id(id).await.context("Failed to get post")?;
        if existing.is_none() {
            return Err(PostServiceError::NotFound(format!(
                "Post with ID {} not found",
                id
            )));
        }

        self.repo.delete(id).await.context("Failed to delete post")?;

        self.invalidate_cache().await;

        Ok(())
    }

    async fn validate_category(&self, category_id: i64) -> Result<(), PostServiceError> {
        let category = self
            .categories
            .get_by_id(category_id)
            .await
            .context("Failed to look up category")?;

        match category {
            Some(c) if c.context == CategoryContext::Blog => Ok(()),
            _ => Err(PostServiceError::InvalidCategory(category_id)),
        }
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("posts:*").await;
    }
}
