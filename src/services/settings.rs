//! Site settings service
//!
//! Typed view over the key-value settings store. Unset keys fall back to
//! defaults so a fresh install renders something sensible.

use crate::cache::{CacheLayer, SharedCache};
use crate::db::repositories::SettingsRepository;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SETTINGS_CACHE_TTL_SECS: u64 = 3600;
const CACHE_KEY_SITE_SETTINGS: &str = "settings:site";

const KEY_STORE_NAME: &str = "store_name";
const KEY_TAGLINE: &str = "tagline";
const KEY_WHATSAPP_NUMBER: &str = "whatsapp_number";
const KEY_ADDRESS: &str = "address";
const KEY_CURRENCY: &str = "currency";
const KEY_PRODUCTS_PER_PAGE: &str = "products_per_page";

/// Error types for settings operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Storefront-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub store_name: String,
    pub tagline: String,
    /// Store WhatsApp number in international format without '+'
    pub whatsapp_number: String,
    pub address: String,
    pub currency: String,
    pub products_per_page: u32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            store_name: "Toko Tani".to_string(),
            tagline: String::new(),
            whatsapp_number: String::new(),
            address: String::new(),
            currency: "IDR".to_string(),
            products_per_page: 24,
        }
    }
}

/// Partial update for site settings; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsInput {
    pub store_name: Option<String>,
    pub tagline: Option<String>,
    pub whatsapp_number: Option<String>,
    pub address: Option<String>,
    pub currency: Option<String>,
    pub products_per_page: Option<u32>,
}

/// Settings service
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    cache: SharedCache,
    cache_ttl: Duration,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, cache: SharedCache) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(SETTINGS_CACHE_TTL_SECS),
        }
    }

    /// Load the site settings, with defaults for unset keys.
    pub async fn get_site_settings(&self) -> Result<SiteSettings, SettingsServiceError> {
        if let Some(settings) = self
            .cache
            .get::<SiteSettings>(CACHE_KEY_SITE_SETTINGS)
            .await
            .ok()
            .flatten()
        {
            return Ok(settings);
        }

        let stored = self
            .repo
            .get_all()
            .await
            .context("Failed to load settings")?;

        let defaults = SiteSettings::default();
        let settings = SiteSettings {
            store_name: stored
                .get(KEY_STORE_NAME)
                .cloned()
                .unwrap_or(defaults.store_name),
            tagline: stored.get(KEY_TAGLINE).cloned().unwrap_or(defaults.tagline),
            whatsapp_number: stored
                .get(KEY_WHATSAPP_NUMBER)
                .cloned()
                .unwrap_or(defaults.whatsapp_number),
            address: stored.get(KEY_ADDRESS).cloned().unwrap_or(defaults.address),
            currency: stored
                .get(KEY_CURRENCY)
                .cloned()
                .unwrap_or(defaults.currency),
            products_per_page: stored
                .get(KEY_PRODUCTS_PER_PAGE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.products_per_page),
        };

        let _ = self
            .cache
            .set(CACHE_KEY_SITE_SETTINGS, &settings, self.cache_ttl)
            .await;

        Ok(settings)
    }

    /// Apply a partial settings update.
    pub async fn update(
        &self,
        input: UpdateSettingsInput,
    ) -> Result<SiteSettings, SettingsServiceError> {
        if let Some(ref name) = input.store_name {
            if name.trim().is_empty() {
                return Err(SettingsServiceError::ValidationError(
                    "Store name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(ref number) = input.whatsapp_number {
            if !number.is_empty() && !number.chars().all(|c| c.is_ascii_digit()) {
                return Err(SettingsServiceError::ValidationError(
                    "WhatsApp number must contain only digits".to_string(),
                ));
            }
        }

        if let Some(v) = input.store_name {
            self.set(KEY_STORE_NAME, &v).await?;
        }
        if let Some(v) = input.tagline {
            self.set(KEY_TAGLINE, &v).await?;
        }
        if let Some(v) = input.whatsapp_number {
            self.set(KEY_WHATSAPP_NUMBER, &v).await?;
        }
        if let Some(v) = input.address {
            self.set(KEY_ADDRESS, &v).await?;
        }
        if let Some(v) = input.currency {
            self.set(KEY_CURRENCY, &v).await?;
        }
        if let Some(v) = input.products_per_page {
            self.set(KEY_PRODUCTS_PER_PAGE, &v.to_string()).await?;
        }

        let _ = self.cache.delete(CACHE_KEY_SITE_SETTINGS).await;

        self.get_site_settings().await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsServiceError> {
        self.repo
            .set(key, value)
            .await
            .context("Failed to store setting")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use crate::db::repositories::SqlxSettingsRepository;

    async fn setup() -> SettingsService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SettingsService::new(
            SqlxSettingsRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
        )
    }

    #[tokio::test]
    async fn test_defaults_on_fresh_install() {
        let service = setup().await;
        let settings = service.get_site_settings().await.unwrap();
        assert_eq!(settings, SiteSettings::default());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let service = setup().await;

        service
            .update(UpdateSettingsInput {
                store_name: Some("Tani Makmur".to_string()),
                whatsapp_number: Some("6281234567890".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let settings = service
            .update(UpdateSettingsInput {
                tagline: Some("Dari petani untuk semua".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(settings.store_name, "Tani Makmur");
        assert_eq!(settings.whatsapp_number, "6281234567890");
        assert_eq!(settings.tagline, "Dari petani untuk semua");
        assert_eq!(settings.currency, "IDR");
    }

    #[tokio::test]
    async fn test_whatsapp_number_digits_only() {
        let service = setup().await;
        let result = service
            .update(UpdateSettingsInput {
                whatsapp_number: Some("+62 812".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(
            result,
            Err(SettingsServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_store_name_rejected() {
        let service = setup().await;
        let result = service
            .update(UpdateSettingsInput {
                store_name: Some("  ".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(
            result,
            Err(SettingsServiceError::ValidationError(_))
        ));
    }
}
