//! Integration service
//!
//! Manages the enabled flags and configuration of external channels.
//! Checkout and the engine bridge call `require_enabled` before doing any
//! work; a disabled provider is surfaced to the API as 403.

use crate::cache::{CacheLayer, SharedCache};
use crate::db::repositories::IntegrationRepository;
use crate::models::integration::{Integration, Provider};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

const INTEGRATION_CACHE_TTL_SECS: u64 = 300;
const CACHE_KEY_INTEGRATION: &str = "integrations:";

/// Error types for integration operations
#[derive(Debug, thiserror::Error)]
pub enum IntegrationServiceError {
    /// Provider is switched off
    #[error("Integration is disabled: {0}")]
    Disabled(Provider),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Integration service
pub struct IntegrationService {
    repo: Arc<dyn IntegrationRepository>,
    cache: SharedCache,
    cache_ttl: Duration,
}

impl IntegrationService {
    pub fn new(repo: Arc<dyn IntegrationRepository>, cache: SharedCache) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(INTEGRATION_CACHE_TTL_SECS),
        }
    }

    /// Get one provider's integration. Providers never configured come back
    /// as disabled with empty config.
    pub async fn get(&self, provider: Provider) -> Result<Integration, IntegrationServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_INTEGRATION, provider);
        if let Some(integration) = self
            .cache
            .get::<Integration>(&cache_key)
            .await
            .ok()
            .flatten()
        {
            return Ok(integration);
        }

        let integration = self
            .repo
            .get(provider)
            .await
            .context("Failed to load integration")?
            .unwrap_or_else(|| Integration::disabled(provider));

        let _ = self.cache.set(&cache_key, &integration, self.cache_ttl).await;

        Ok(integration)
    }

    /// List all providers, filling in disabled defaults for any not yet
    /// stored.
    pub async fn list(&self) -> Result<Vec<Integration>, IntegrationServiceError> {
        let stored = self
            .repo
            .list()
            .await
            .context("Failed to list integrations")?;

        let list = Provider::all()
            .iter()
            .map(|provider| {
                stored
                    .iter()
                    .find(|i| i.provider == *provider)
                    .cloned()
                    .unwrap_or_else(|| Integration::disabled(*provider))
            })
            .collect();

        Ok(list)
    }

    /// Replace a provider's configuration and enabled flag.
    pub async fn update(
        &self,
        provider: Provider,
        enabled: bool,
        config: serde_json::Value,
    ) -> Result<Integration, IntegrationServiceError> {
        if !config.is_object() {
            return Err(IntegrationServiceError::ValidationError(
                "Integration config must be a JSON object".to_string(),
            ));
        }

        let integration = Integration {
            provider,
            enabled,
            config,
            updated_at: chrono::Utc::now(),
        };

        self.repo
            .upsert(&integration)
            .await
            .context("Failed to save integration")?;

        self.invalidate_cache().await;

        tracing::info!(provider = %provider, enabled, "Integration updated");

        Ok(integration)
    }

    /// Flip the enabled flag without touching the stored config.
    pub async fn set_enabled(
        &self,
        provider: Provider,
        enabled: bool,
    ) -> Result<(), IntegrationServiceError> {
        self.repo
            .set_enabled(provider, enabled)
            .await
            .context("Failed to toggle integration")?;

        self.invalidate_cache().await;

        Ok(())
    }

    /// Load the integration and fail if it is disabled.
    pub async fn require_enabled(
        &self,
        provider: Provider,
    ) -> Result<Integration, IntegrationServiceError> {
        let integration = self.get(provider).await?;
        if !integration.enabled {
            return Err(IntegrationServiceError::Disabled(provider));
        }
        Ok(integration)
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("integrations:*").await;
    }
}
