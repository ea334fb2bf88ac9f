//! Integration repository

use crate::models::integration::{Integration, Provider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Integration repository trait
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// Get the row for a provider
    async fn get(&self, provider: Provider) -> Result<Option<Integration>>;

    /// List all configured integrations
    async fn list(&self) -> Result<Vec<Integration>>;

    /// Insert or replace an integration row
    async fn upsert(&self, integration: &Integration) -> Result<()>;

    /// Flip the enabled flag for a provider
    async fn set_enabled(&self, provider: Provider, enabled: bool) -> Result<()>;
}

/// SQLx-based integration repository implementation
pub struct SqlxIntegrationRepository {
    pool: SqlitePool,
}

impl SqlxIntegrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn IntegrationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl IntegrationRepository for SqlxIntegrationRepository {
    async fn get(&self, provider: Provider) -> Result<Option<Integration>> {
        let row = sqlx::query(
            "SELECT provider, enabled, config, updated_at FROM integrations WHERE provider = ?",
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get integration")?;

        row.map(|row| row_to_integration(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Integration>> {
        let rows =
            sqlx::query("SELECT provider, enabled, config, updated_at FROM integrations ORDER BY provider")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list integrations")?;

        rows.iter().map(row_to_integration).collect()
    }

    async fn upsert(&self, integration: &Integration) -> Result<()> {
        let config = serde_json::to_string(&integration.config)
            .context("Failed to serialize integration config")?;

        sqlx::query(
            r#"
            INSERT INTO integrations (provider, enabled, config, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(provider) DO UPDATE
            SET enabled = excluded.enabled, config = excluded.config,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(integration.provider.as_str())
        .bind(integration.enabled)
        .bind(&config)
        .execute(&self.pool)
        .await
        .context("Failed to upsert integration")?;
        Ok(())
    }

    async fn set_enabled(&self, provider: Provider, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO integrations (provider, enabled, config, updated_at)
            VALUES (?, ?, '{}', CURRENT_TIMESTAMP)
            ON CONFLICT(provider) DO UPDATE
            SET enabled = excluded.enabled, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(provider.as_str())
        .bind(enabled)
        .execute(&self.pool)
        .await
        .context("Failed to toggle integration")?;
        Ok(())
    }
}

/// Map a database row to an Integration
fn row_to_integration(row: &sqlx::sqlite::SqliteRow) -> Result<Integration> {
    let provider_str: String = row.get("provider");
    let provider = Provider::parse(&provider_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown provider: {}", provider_str))?;

    let config_json: String = row.get("config");
    let config: serde_json::Value =
        serde_json::from_str(&config_json).context("Failed to deserialize integration config")?;

    Ok(Integration {
        provider,
        enabled: row.get("enabled"),
        config,
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use chrono::Utc;

    async fn setup() -> SqlxIntegrationRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SqlxIntegrationRepository::new(pool)
    }

    #[tokio::test]
    async fn test_missing_provider_returns_none() {
        let repo = setup().await;
        assert!(repo.get(Provider::Whatsapp).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = setup().await;

        let integration = Integration {
            provider: Provider::Whatsapp,
            enabled: true,
            config: serde_json::json!({"phone": "6281234567890"}),
            updated_at: Utc::now(),
        };
        repo.upsert(&integration).await.unwrap();

        let fetched = repo.get(Provider::Whatsapp).await.unwrap().unwrap();
        assert!(fetched.enabled);
        assert_eq!(fetched.config_str("phone"), Some("6281234567890"));
    }

    #[tokio::test]
    async fn test_set_enabled_creates_row() {
        let repo = setup().await;

        repo.set_enabled(Provider::Engine, true).await.unwrap();
        let fetched = repo.get(Provider::Engine).await.unwrap().unwrap();
        assert!(fetched.enabled);

        repo.set_enabled(Provider::Engine, false).await.unwrap();
        let fetched = repo.get(Provider::Engine).await.unwrap().unwrap();
        assert!(!fetched.enabled);
    }

    #[tokio::test]
    async fn test_set_enabled_keeps_config() {
        let repo = setup().await;

        let integration = Integration {
            provider: Provider::Tokopedia,
            enabled: true,
            config: serde_json::json!({"store_url": "https://tokopedia.com/tokotani"}),
            updated_at: Utc::now(),
        };
        repo.upsert(&integration).await.unwrap();

        repo.set_enabled(Provider::Tokopedia, false).await.unwrap();
        let fetched = repo.get(Provider::Tokopedia).await.unwrap().unwrap();
        assert!(!fetched.enabled);
        assert_eq!(
            fetched.config_str("store_url"),
            Some("https://tokopedia.com/tokotani")
        );
    }

    #[tokio::test]
    async fn test_list() {
        let repo = setup().await;

        repo.set_enabled(Provider::Whatsapp, true).await.unwrap();
        repo.set_enabled(Provider::Shopee, false).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
