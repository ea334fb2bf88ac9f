//! Category model
//!
//! Categories form per-context trees: product categories, blog categories,
//! and the generation topics fed to the AI engine each live in their own
//! forest. A slug is unique within its context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which content surface a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryContext {
    /// Product catalog categories
    Product,
    /// Blog post categories
    Blog,
    /// Topic categories for AI content generation
    Ai,
}

impl CategoryContext {
    /// String form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryContext::Product => "product",
            CategoryContext::Blog => "blog",
            CategoryContext::Ai => "ai",
        }
    }

    /// Parse from the stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(CategoryContext::Product),
            "blog" => Some(CategoryContext::Blog),
            "ai" => Some(CategoryContext::Ai),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug, unique within the context
    pub slug: String,
    /// Category name
    pub name: String,
    /// Category description
    pub description: Option<String>,
    /// Content surface this category belongs to
    pub context: CategoryContext,
    /// Parent category ID (for hierarchical structure)
    pub parent_id: Option<i64>,
    /// Sort order within parent
    pub sort_order: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category with the given parameters.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(
        slug: String,
        name: String,
        context: CategoryContext,
        parent_id: Option<i64>,
        sort_order: i32,
    ) -> Self {
        Self {
            id: 0, // Will be set by the database
            slug,
            name,
            description: None,
            context,
            parent_id,
            sort_order,
            created_at: Utc::now(),
        }
    }

    /// Check if this is a root category (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Category with its children for tree representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    /// The category itself
    #[serde(flatten)]
    pub category: Category,
    /// Child categories
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Create a tree node with no children
    pub fn new(category: Category) -> Self {
        Self {
            category,
            children: Vec::new(),
        }
    }

    /// Create a tree node with children
    pub fn with_children(category: Category, children: Vec<CategoryTreeNode>) -> Self {
        Self { category, children }
    }

    /// Get the total count of this category and all descendants
    pub fn total_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.total_count()).sum::<usize>()
    }

    /// Height of the subtree rooted at this node (a leaf has height 1)
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(|c| c.height()).max().unwrap_or(0)
    }

    /// Get all descendant IDs (not including self)
    pub fn descendant_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for child in &self.children {
            ids.push(child.category.id);
            ids.extend(child.descendant_ids());
        }
        ids
    }
}

/// Input for creating a new category
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name (the slug is derived from this unless given)
    pub name: String,
    /// Explicit slug; generated from the name when absent
    pub slug: Option<String>,
    /// Category description
    pub description: Option<String>,
    /// Content surface
    pub context: CategoryContext,
    /// Parent category ID
    pub parent_id: Option<i64>,
    /// Sort order within parent
    pub sort_order: Option<i32>,
}

/// Input for updating a category
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New description (optional; `Some(None)` clears it)
    pub description: Option<Option<String>>,
    /// New parent ID (optional; `Some(None)` makes it a root)
    pub parent_id: Option<Option<i64>>,
    /// New sort order (optional)
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_roundtrip() {
        for context in [
            CategoryContext::Product,
            CategoryContext::Blog,
            CategoryContext::Ai,
        ] {
            assert_eq!(CategoryContext::parse(context.as_str()), Some(context));
        }
        assert_eq!(CategoryContext::parse("unknown"), None);
    }

    #[test]
    fn test_category_is_root() {
        let root = Category::new(
            "pupuk".to_string(),
            "Pupuk".to_string(),
            CategoryContext::Product,
            None,
            0,
        );
        let child = Category::new(
            "pupuk-organik".to_string(),
            "Pupuk Organik".to_string(),
            CategoryContext::Product,
            Some(1),
            0,
        );

        assert!(root.is_root());
        assert!(!child.is_root());
    }

    #[test]
    fn test_tree_total_count_and_height() {
        let mut root = Category::new(
            "benih".to_string(),
            "Benih".to_string(),
            CategoryContext::Product,
            None,
            0,
        );
        root.id = 1;
        let mut child = Category::new(
            "benih-padi".to_string(),
            "Benih Padi".to_string(),
            CategoryContext::Product,
            Some(1),
            0,
        );
        child.id = 2;
        let mut grandchild = Category::new(
            "benih-padi-hibrida".to_string(),
            "Benih Padi Hibrida".to_string(),
            CategoryContext::Product,
            Some(2),
            0,
        );
        grandchild.id = 3;

        let tree = CategoryTreeNode::with_children(
            root,
            vec![CategoryTreeNode::with_children(
                child,
                vec![CategoryTreeNode::new(grandchild)],
            )],
        );

        assert_eq!(tree.total_count(), 3);
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.descendant_ids(), vec![2, 3]);
    }
}
