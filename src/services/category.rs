//! Category service
//!
//! Business logic for context-tagged category trees:
//! - slug generation with auto-incrementing suffixes on collision
//! - depth limit of 4 levels
//! - circular-reference prevention (visited-set parent walk)
//! - deletion re-parents children and moves content to uncategorized

use crate::cache::{CacheLayer, SharedCache};
use crate::db::repositories::{CategoryRepository, PostRepository, ProductRepository};
use crate::models::category::{
    Category, CategoryContext, CategoryTreeNode, CreateCategoryInput, UpdateCategoryInput,
};
use crate::services::slug::{ensure_unique_slug, generate_slug};
use anyhow::Context;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of levels in a category tree
pub const MAX_TREE_DEPTH: usize = 4;

/// Default cache TTL for categories (1 hour)
const CATEGORY_CACHE_TTL_SECS: u64 = 3600;

/// Cache key prefixes
const CACHE_KEY_CATEGORY_BY_ID: &str = "categories:id:";
const CACHE_KEY_CATEGORY_TREE: &str = "categories:tree:";
const CACHE_KEY_CATEGORY_LIST: &str = "categories:list:";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Parent category not found
    #[error("Parent category not found: {0}")]
    ParentNotFound(i64),

    /// Parent belongs to a different context
    #[error("Parent category belongs to a different context")]
    ContextMismatch,

    /// Circular reference detected
    #[error("Circular reference detected: category cannot be its own ancestor")]
    CircularReference,

    /// Tree would exceed the depth limit
    #[error("Category tree cannot exceed {MAX_TREE_DEPTH} levels")]
    TooDeep,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    posts: Arc<dyn PostRepository>,
    cache: SharedCache,
    cache_ttl: Duration,
}

impl CategoryService {
    pub fn new(
        repo: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
        posts: Arc<dyn PostRepository>,
        cache: SharedCache,
    ) -> Self {
        Self {
            repo,
            products,
            posts,
            cache,
            cache_ttl: Duration::from_secs(CATEGORY_CACHE_TTL_SECS),
        }
    }

    /// Create a new category.
    ///
    /// The slug is derived from the name unless given explicitly; either
    /// way, collisions within the context are resolved with `-2`, `-3`, ...
    /// suffixes.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        if input.name.trim().is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        // Validate parent and the resulting depth
        if let Some(parent_id) = input.parent_id {
            let parent = self
                .repo
                .get_by_id(parent_id)
                .await
                .context("Failed to get parent category")?
                .ok_or(CategoryServiceError::ParentNotFound(parent_id))?;

            if parent.context != input.context {
                return Err(CategoryServiceError::ContextMismatch);
            }

            let parent_depth = self.ancestor_depth(parent_id).await?;
            if parent_depth + 1 > MAX_TREE_DEPTH {
                return Err(CategoryServiceError::TooDeep);
            }
        }

        let base = input
            .slug
            .map(|s| generate_slug(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));

        let context = input.context;
        let repo = self.repo.clone();
        let slug = ensure_unique_slug(&base, move |candidate| {
            let repo = repo.clone();
            async move { repo.exists_by_slug(context, &candidate).await }
        })
        .await?;

        let mut category = Category::new(
            slug,
            input.name,
            input.context,
            input.parent_id,
            input.sort_order.unwrap_or(0),
        );
        category.description = input.description;

        let created = self
            .repo
            .create(&category)
            .await
            .context("Failed to create category")?;

        self.invalidate_cache().await;

        Ok(created)
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_CATEGORY_BY_ID, id);
        if let Some(category) = self.cache.get::<Category>(&cache_key).await.ok().flatten() {
            return Ok(Some(category));
        }

        let category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category by ID")?;

        if let Some(ref cat) = category {
            let _ = self.cache.set(&cache_key, cat, self.cache_ttl).await;
        }

        Ok(category)
    }

    /// Get category by slug within a context
    pub async fn get_by_slug(
        &self,
        context: CategoryContext,
        slug: &str,
    ) -> Result<Option<Category>, CategoryServiceError> {
        self.repo
            .get_by_slug(context, slug)
            .await
            .context("Failed to get category by slug")
            .map_err(Into::into)
    }

    /// List a context's categories (flat)
    pub async fn list(
        &self,
        context: CategoryContext,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_CATEGORY_LIST, context);
        if let Some(list) = self
            .cache
            .get::<Vec<Category>>(&cache_key)
            .await
            .ok()
            .flatten()
        {
            return Ok(list);
        }

        let list = self
            .repo
            .list(context)
            .await
            .context("Failed to list categories")?;

        let _ = self.cache.set(&cache_key, &list, self.cache_ttl).await;

        Ok(list)
    }

    /// List a context's categories as a tree
    pub async fn list_tree(
        &self,
        context: CategoryContext,
    ) -> Result<Vec<CategoryTreeNode>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_CATEGORY_TREE, context);
        if let Some(tree) = self
            .cache
            .get::<Vec<CategoryTreeNode>>(&cache_key)
            .await
            .ok()
            .flatten()
        {
            return Ok(tree);
        }

        let tree = self
            .repo
            .list_tree(context)
            .await
            .context("Failed to get category tree")?;

        let _ = self.cache.set(&cache_key, &tree, self.cache_ttl).await;

        Ok(tree)
    }

    /// Update a category.
    ///
    /// Re-parenting is validated for cycles and the depth limit, taking the
    /// height of the moved subtree into account.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| {
                CategoryServiceError::NotFound(format!("Category with ID {} not found", id))
            })?;

        if let Some(ref new_name) = input.name {
            if new_name.trim().is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            category.name = new_name.clone();
        }

        if let Some(ref new_slug) = input.slug {
            let base = generate_slug(new_slug);
            if base != category.slug {
                let context = category.context;
                let repo = self.repo.clone();
                category.slug = ensure_unique_slug(&base, move |candidate| {
                    let repo = repo.clone();
                    async move { repo.exists_by_slug(context, &candidate).await }
                })
                .await?;
            }
        }

        if let Some(ref new_description) = input.description {
            category.description = new_description.clone();
        }

        if let Some(new_parent_id) = input.parent_id {
            if let Some(parent_id) = new_parent_id {
                let parent = self
                    .repo
                    .get_by_id(parent_id)
                    .await
                    .context("Failed to get parent category")?
                    .ok_or(CategoryServiceError::ParentNotFound(parent_id))?;

                if parent.context != category.context {
                    return Err(CategoryServiceError::ContextMismatch);
                }

                if self.would_create_cycle(id, parent_id).await? {
                    return Err(CategoryServiceError::CircularReference);
                }

                // The whole moved subtree has to fit under the new parent
                let parent_depth = self.ancestor_depth(parent_id).await?;
                let subtree_height = self.subtree_height(id).await?;
                if parent_depth + subtree_height > MAX_TREE_DEPTH {
                    return Err(CategoryServiceError::TooDeep);
                }
            }
            category.parent_id = new_parent_id;
        }

        if let Some(new_sort_order) = input.sort_order {
            category.sort_order = new_sort_order;
        }

        let updated = self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?;

        self.invalidate_cache().await;

        Ok(updated)
    }

    /// Delete a category.
    ///
    /// Direct children are re-parented to the deleted node's parent;
    /// products and posts in the category become uncategorized.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| {
                CategoryServiceError::NotFound(format!("Category with ID {} not found", id))
            })?;

        self.repo
            .reparent_children(id, category.parent_id)
            .await
            .context("Failed to re-parent children")?;

        match category.context {
            CategoryContext::Product => {
                self.products
                    .move_category(id, None)
                    .await
                    .context("Failed to move products")?;
            }
            CategoryContext::Blog => {
                self.posts
                    .move_category(id, None)
                    .await
                    .context("Failed to move posts")?;
            }
            CategoryContext::Ai => {}
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete category")?;

        self.invalidate_cache().await;

        Ok(())
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    /// Number of nodes on the chain from a category up to its root,
    /// including the category itself.
    ///
    /// Walks parent links with a visited set so corrupted data with a
    /// parent cycle fails cleanly instead of looping forever.
    async fn ancestor_depth(&self, id: i64) -> Result<usize, CategoryServiceError> {
        let mut visited = HashSet::new();
        let mut depth = 0;
        let mut current = Some(id);

        while let Some(node_id) = current {
            if !visited.insert(node_id) {
                return Err(CategoryServiceError::CircularReference);
            }
            depth += 1;

            let node = self
                .repo
                .get_by_id(node_id)
                .await
                .context("Failed to walk parent chain")?
                .ok_or(CategoryServiceError::ParentNotFound(node_id))?;
            current = node.parent_id;
        }

        Ok(depth)
    }

    /// Height of the subtree rooted at a category (the category itself
    /// counts as 1).
    async fn subtree_height(&self, id: i64) -> Result<usize, CategoryServiceError> {
        let mut visited = HashSet::new();
        self.subtree_height_inner(id, &mut visited).await
    }

    async fn subtree_height_inner(
        &self,
        id: i64,
        visited: &mut HashSet<i64>,
    ) -> Result<usize, CategoryServiceError> {
        if !visited.insert(id) {
            return Err(CategoryServiceError::CircularReference);
        }

        let children = self
            .repo
            .get_children(id)
            .await
            .context("Failed to get children")?;

        let mut max_child = 0;
        for child in children {
            let h = Box::pin(self.subtree_height_inner(child.id, visited)).await?;
            max_child = max_child.max(h);
        }

        Ok(1 + max_child)
    }

    /// Check if setting `new_parent_id` as parent of `category_id` would
    /// create a cycle.
    async fn would_create_cycle(
        &self,
        category_id: i64,
        new_parent_id: i64,
    ) -> Result<bool, CategoryServiceError> {
        if category_id == new_parent_id {
            return Ok(true);
        }

        let descendants = self
            .repo
            .get_all_descendants(category_id)
            .await
            .context("Failed to get descendants")?;

        Ok(descendants.contains(&new_parent_id))
    }

    /// Invalidate all category-related cache entries
    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("categories:*").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxPostRepository, SqlxProductRepository,
    };

    async fn setup() -> CategoryService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        CategoryService::new(
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxProductRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
        )
    }

    fn input(name: &str, parent: Option<i64>) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            slug: None,
            description: None,
            context: CategoryContext::Product,
            parent_id: parent,
            sort_order: None,
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let service = setup().await;

        let created = service.create(input("Pupuk Organik", None)).await.unwrap();
        assert_eq!(created.slug, "pupuk-organik");
    }

    #[tokio::test]
    async fn test_slug_collision_appends_suffix() {
        let service = setup().await;

        let first = service.create(input("Beras", None)).await.unwrap();
        let second = service.create(input("Beras", None)).await.unwrap();
        let third = service.create(input("Beras", None)).await.unwrap();

        assert_eq!(first.slug, "beras");
        assert_eq!(second.slug, "beras-2");
        assert_eq!(third.slug, "beras-3");
    }

    #[tokio::test]
    async fn test_same_slug_allowed_across_contexts() {
        let service = setup().await;

        service.create(input("Pupuk", None)).await.unwrap();

        let blog = service
            .create(CreateCategoryInput {
                context: CategoryContext::Blog,
                ..input("Pupuk", None)
            })
            .await
            .unwrap();
        // No suffix: the blog context has its own namespace
        assert_eq!(blog.slug, "pupuk");
    }

    #[tokio::test]
    async fn test_depth_limit_on_create() {
        let service = setup().await;

        let l1 = service.create(input("Satu", None)).await.unwrap();
        let l2 = service.create(input("Dua", Some(l1.id))).await.unwrap();
        let l3 = service.create(input("Tiga", Some(l2.id))).await.unwrap();
        let l4 = service.create(input("Empat", Some(l3.id))).await.unwrap();

        // Level 5 exceeds the limit
        let result = service.create(input("Lima", Some(l4.id))).await;
        assert!(matches!(result, Err(CategoryServiceError::TooDeep)));
    }

    #[tokio::test]
    async fn test_reparent_cycle_rejected() {
        let service = setup().await;

        let root = service.create(input("Akar", None)).await.unwrap();
        let child = service.create(input("Anak", Some(root.id))).await.unwrap();

        // Root cannot become a child of its own descendant
        let result = service
            .update(
                root.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(child.id)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CategoryServiceError::CircularReference)));

        // Nor its own parent
        let result = service
            .update(
                root.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(root.id)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CategoryServiceError::CircularReference)));
    }

    #[tokio::test]
    async fn test_reparent_depth_accounts_for_subtree() {
        let service = setup().await;

        // Chain of 3
        let a1 = service.create(input("A1", None)).await.unwrap();
        let a2 = service.create(input("A2", Some(a1.id))).await.unwrap();
        service.create(input("A3", Some(a2.id))).await.unwrap();

        // Separate chain of 2
        let b1 = service.create(input("B1", None)).await.unwrap();
        let b2 = service.create(input("B2", Some(b1.id))).await.unwrap();

        // Moving A1 (height 3) under B2 (depth 2) would make 5 levels
        let result = service
            .update(
                a1.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(b2.id)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CategoryServiceError::TooDeep)));

        // Moving A1 under B1 (depth 1) gives exactly 4 levels, which is fine
        let moved = service
            .update(
                a1.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(b1.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(b1.id));
    }

    #[tokio::test]
    async fn test_parent_context_mismatch_rejected() {
        let service = setup().await;

        let product_cat = service.create(input("Produk", None)).await.unwrap();
        let result = service
            .create(CreateCategoryInput {
                context: CategoryContext::Blog,
                ..input("Artikel", Some(product_cat.id))
            })
            .await;
        assert!(matches!(result, Err(CategoryServiceError::ContextMismatch)));
    }

    #[tokio::test]
    async fn test_delete_reparents_children() {
        let service = setup().await;

        let root = service.create(input("Akar", None)).await.unwrap();
        let mid = service.create(input("Tengah", Some(root.id))).await.unwrap();
        let leaf = service.create(input("Daun", Some(mid.id))).await.unwrap();

        service.delete(mid.id).await.unwrap();

        let leaf = service.get_by_id(leaf.id).await.unwrap().unwrap();
        assert_eq!(leaf.parent_id, Some(root.id));
    }

    #[tokio::test]
    async fn test_list_tree() {
        let service = setup().await;

        let root = service.create(input("Alat", None)).await.unwrap();
        service.create(input("Cangkul", Some(root.id))).await.unwrap();

        let tree = service.list_tree(CategoryContext::Product).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
    }

    #[tokio::test]
    async fn test_tree_cache_invalidated_on_create() {
        let service = setup().await;

        service.create(input("Pertama", None)).await.unwrap();
        let before = service.list_tree(CategoryContext::Product).await.unwrap();
        assert_eq!(before.len(), 1);

        service.create(input("Kedua", None)).await.unwrap();
        let after = service.list_tree(CategoryContext::Product).await.unwrap();
        assert_eq!(after.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let service = setup().await;
        let result = service.create(input("   ", None)).await;
        assert!(matches!(result, Err(CategoryServiceError::ValidationError(_))));
    }
}
