//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::ProductEngine;

/// Post lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Post title
    pub title: String,
    /// Body HTML
    pub body: String,
    /// Category ID (blog context)
    pub category_id: Option<i64>,
    /// Lifecycle status
    pub status: PostStatus,
    /// Body provenance
    pub engine: ProductEngine,
    /// When the post was published
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Check if the post is visible on the public storefront
    pub fn is_public(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub title: String,
    /// Explicit slug; generated from the title when absent
    pub slug: Option<String>,
    pub body: String,
    pub category_id: Option<i64>,
    pub status: PostStatus,
    pub engine: ProductEngine,
}

impl CreatePostInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: None,
            body: String::new(),
            category_id: None,
            status: PostStatus::Draft,
            engine: ProductEngine::Manual,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }
}

/// Input for updating a post
#[derive(Debug, Clone, Default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub category_id: Option<Option<i64>>,
    pub status: Option<PostStatus>,
}
