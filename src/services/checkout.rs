//! Checkout brokering
//!
//! There is no cart or payment flow. Checkout hands the visitor off to an
//! external channel: a prefilled WhatsApp chat with the store, or the
//! product's marketplace listing. Each handoff is recorded as a visitor
//! event.

use crate::db::repositories::{EventRepository, ProductRepository};
use crate::models::event::{EventType, VisitorEvent};
use crate::models::integration::Provider;
use crate::models::product::Product;
use crate::services::integration::{IntegrationService, IntegrationServiceError};
use anyhow::Context;
use std::sync::Arc;

/// Error types for checkout operations
#[derive(Debug, thiserror::Error)]
pub enum CheckoutServiceError {
    /// Product missing or not active
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The channel is switched off
    #[error("Integration is disabled: {0}")]
    IntegrationDisabled(Provider),

    /// The channel is enabled but missing required configuration
    #[error("Integration {0} is missing config key '{1}'")]
    MissingConfig(Provider, &'static str),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<IntegrationServiceError> for CheckoutServiceError {
    fn from(err: IntegrationServiceError) -> Self {
        match err {
            IntegrationServiceError::Disabled(provider) => {
                CheckoutServiceError::IntegrationDisabled(provider)
            }
            IntegrationServiceError::ValidationError(msg) => {
                CheckoutServiceError::ValidationError(msg)
            }
            IntegrationServiceError::InternalError(e) => CheckoutServiceError::InternalError(e),
        }
    }
}

/// A checkout handoff link
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutLink {
    pub url: String,
    pub provider: Provider,
}

/// Checkout service
pub struct CheckoutService {
    products: Arc<dyn ProductRepository>,
    integrations: Arc<IntegrationService>,
    events: Arc<dyn EventRepository>,
}

impl CheckoutService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        integrations: Arc<IntegrationService>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            products,
            integrations,
            events,
        }
    }

    /// Build a wa.me link with a prefilled order message for a product.
    pub async fn whatsapp_link(
        &self,
        product_slug: &str,
        quantity: i64,
    ) -> Result<CheckoutLink, CheckoutServiceError> {
        if quantity < 1 {
            return Err(CheckoutServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self.active_product(product_slug).await?;

        let integration = self.integrations.require_enabled(Provider::Whatsapp).await?;
        let phone = integration
            .config_str("phone")
            .filter(|p| !p.is_empty())
            .ok_or(CheckoutServiceError::MissingConfig(
                Provider::Whatsapp,
                "phone",
            ))?;

        let message = order_message(&product, quantity);
        let url = format!(
            "https://wa.me/{}?text={}",
            phone,
            urlencoding::encode(&message)
        );

        self.record_click(EventType::WhatsappClick, &product).await;

        Ok(CheckoutLink {
            url,
            provider: Provider::Whatsapp,
        })
    }

    /// Build a link to the product's marketplace listing.
    pub async fn marketplace_link(
        &self,
        provider: Provider,
        product_slug: &str,
    ) -> Result<CheckoutLink, CheckoutServiceError> {
        if !provider.is_marketplace() {
            return Err(CheckoutServiceError::ValidationError(format!(
                "Not a marketplace provider: {}",
                provider
            )));
        }

        let product = self.active_product(product_slug).await?;

        let integration = self.integrations.require_enabled(provider).await?;
        let store_url = integration
            .config_str("store_url")
            .filter(|u| !u.is_empty())
            .ok_or(CheckoutServiceError::MissingConfig(provider, "store_url"))?;

        // Per-product listing URL stored in attributes wins over the
        // store-level fallback
        let attr_key = format!("{}_url", provider.as_str());
        let url = product
            .attributes
            .get(&attr_key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/{}", store_url.trim_end_matches('/'), product.slug));

        self.record_click(EventType::MarketplaceClick, &product).await;

        Ok(CheckoutLink { url, provider })
    }

    async fn active_product(&self, slug: &str) -> Result<Product, CheckoutServiceError> {
        self.products
            .get_by_slug(slug)
            .await
            .context("Failed to load product")?
            .filter(Product::is_public)
            .ok_or_else(|| CheckoutServiceError::ProductNotFound(slug.to_string()))
    }

    /// A failed event write never blocks the handoff.
    async fn record_click(&self, event_type: EventType, product: &Product) {
        let event = VisitorEvent {
            id: 0,
            event_type,
            path: format!("/produk/{}", product.slug),
            product_slug: Some(product.slug.clone()),
            referrer: None,
            user_agent: None,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.events.record(&event).await {
            tracing::warn!(error = %e, "Failed to record checkout click");
        }
    }
}

/// Prefilled WhatsApp order message.
fn order_message(product: &Product, quantity: i64) -> String {
    let total = product.price * quantity;
    format!(
        "Halo, saya ingin memesan:\n\n{}\nJumlah: {}\nHarga satuan: {}\nTotal: {}\n\nMohon info ketersediaan dan ongkirnya. Terima kasih!",
        product.name,
        quantity,
        format_rupiah(product.price),
        format_rupiah(total),
    )
}

/// Format an amount as rupiah with dot thousand separators (Rp85.000).
fn format_rupiah(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-Rp{}", grouped)
    } else {
        format!("Rp{}", grouped)
    }
}
