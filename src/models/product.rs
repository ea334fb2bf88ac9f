//! Product model
//!
//! A product carries both the public storefront fields and internal
//! merchandising data. The internal fields (`wholesale_prices`,
//! `attributes`, `status`, `engine`) stay inside the admin surface; the
//! public API exposes a separate DTO that omits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Not yet visible on the storefront
    Draft,
    /// Live on the storefront
    Active,
    /// Retired; hidden from the storefront but kept for records
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ProductStatus::Draft),
            "active" => Some(ProductStatus::Active),
            "archived" => Some(ProductStatus::Archived),
            _ => None,
        }
    }
}

/// Provenance of the product description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductEngine {
    /// Written by a human
    Manual,
    /// Produced through the AI generation pipeline
    Generated,
}

impl ProductEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductEngine::Manual => "manual",
            ProductEngine::Generated => "generated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(ProductEngine::Manual),
            "generated" => Some(ProductEngine::Generated),
            _ => None,
        }
    }
}

/// A wholesale price tier (internal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WholesaleTier {
    /// Minimum quantity for this tier
    pub min_qty: i64,
    /// Unit price in rupiah at this tier
    pub price: i64,
}

/// A product image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL or local path
    pub url: String,
    /// Role of the image (e.g. "hero", "gallery")
    #[serde(default)]
    pub role: Option<String>,
    /// Alt text
    #[serde(default)]
    pub alt: Option<String>,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Product name
    pub name: String,
    /// Description HTML
    pub description: String,
    /// Category ID (product context)
    pub category_id: Option<i64>,
    /// Retail price in rupiah; this is the single value shown publicly
    pub price: i64,
    /// Internal wholesale tiers
    pub wholesale_prices: Vec<WholesaleTier>,
    /// Internal free-form attributes
    pub attributes: serde_json::Value,
    /// Lifecycle status
    pub status: ProductStatus,
    /// Description provenance
    pub engine: ProductEngine,
    /// Comma-separated SEO keywords; the first is the primary keyword
    pub seo_keywords: String,
    /// Product images
    pub images: Vec<ProductImage>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Check if the product is visible on the public storefront
    pub fn is_public(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Primary SEO keyword, if any
    pub fn primary_keyword(&self) -> Option<&str> {
        self.seo_keywords
            .split(',')
            .map(str::trim)
            .find(|k| !k.is_empty())
    }
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    /// Explicit slug; generated from the name when absent
    pub slug: Option<String>,
    pub description: String,
    pub category_id: Option<i64>,
    pub price: i64,
    pub wholesale_prices: Vec<WholesaleTier>,
    pub attributes: serde_json::Value,
    pub status: ProductStatus,
    pub engine: ProductEngine,
    pub seo_keywords: String,
    pub images: Vec<ProductImage>,
}

impl CreateProductInput {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            slug: None,
            description: String::new(),
            category_id: None,
            price,
            wholesale_prices: Vec::new(),
            attributes: serde_json::Value::Object(Default::default()),
            status: ProductStatus::Draft,
            engine: ProductEngine::Manual,
            seo_keywords: String::new(),
            images: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_engine(mut self, engine: ProductEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_seo_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.seo_keywords = keywords.into();
        self
    }

    pub fn with_images(mut self, images: Vec<ProductImage>) -> Self {
        self.images = images;
        self
    }
}

/// Input for updating a product
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Option<i64>>,
    pub price: Option<i64>,
    pub wholesale_prices: Option<Vec<WholesaleTier>>,
    pub attributes: Option<serde_json::Value>,
    pub status: Option<ProductStatus>,
    pub seo_keywords: Option<String>,
    pub images: Option<Vec<ProductImage>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: 1,
            slug: "beras-organik-5kg".to_string(),
            name: "Beras Organik 5kg".to_string(),
            description: "<p>Beras organik premium.</p>".to_string(),
            category_id: Some(2),
            price: 85_000,
            wholesale_prices: vec![WholesaleTier {
                min_qty: 10,
                price: 78_000,
            }],
            attributes: serde_json::json!({"berat": "5kg"}),
            status: ProductStatus::Active,
            engine: ProductEngine::Manual,
            seo_keywords: "beras organik, beras sehat".to_string(),
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Active,
            ProductStatus::Archived,
        ] {
            assert_eq!(ProductStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProductStatus::parse("unknown"), None);
    }

    #[test]
    fn test_is_public() {
        let mut product = sample_product();
        assert!(product.is_public());

        product.status = ProductStatus::Draft;
        assert!(!product.is_public());

        product.status = ProductStatus::Archived;
        assert!(!product.is_public());
    }

    #[test]
    fn test_primary_keyword() {
        let product = sample_product();
        assert_eq!(product.primary_keyword(), Some("beras organik"));

        let mut empty = sample_product();
        empty.seo_keywords = String::new();
        assert_eq!(empty.primary_keyword(), None);

        let mut padded = sample_product();
        padded.seo_keywords = " , pupuk kandang".to_string();
        assert_eq!(padded.primary_keyword(), Some("pupuk kandang"));
    }

    #[test]
    fn test_create_input_builder() {
        let input = CreateProductInput::new("Pupuk NPK", 120_000)
            .with_category(3)
            .with_status(ProductStatus::Active)
            .with_seo_keywords("pupuk npk");

        assert_eq!(input.name, "Pupuk NPK");
        assert_eq!(input.price, 120_000);
        assert_eq!(input.category_id, Some(3));
        assert_eq!(input.status, ProductStatus::Active);
        assert_eq!(input.engine, ProductEngine::Manual);
    }
}
