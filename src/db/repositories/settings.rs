//! Settings repository
//!
//! Simple key-value storage; the typed view lives in the settings service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Settings repository trait
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a setting value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a setting value (upsert)
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Get all settings as a map
    async fn get_all(&self) -> Result<HashMap<String, String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;
}

/// SQLx-based settings repository implementation
pub struct SqlxSettingsRepository {
    pool: SqlitePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get setting")?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("Failed to set setting")?;
        Ok(())
    }

    async fn get_all(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list settings")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to delete setting")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;

    async fn setup() -> SqlxSettingsRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        SqlxSettingsRepository::new(pool)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let repo = setup().await;

        repo.set("store_name", "Toko Tani Makmur").await.unwrap();
        let value = repo.get("store_name").await.unwrap();
        assert_eq!(value.as_deref(), Some("Toko Tani Makmur"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let repo = setup().await;

        repo.set("currency", "IDR").await.unwrap();
        repo.set("currency", "Rp").await.unwrap();

        let value = repo.get("currency").await.unwrap();
        assert_eq!(value.as_deref(), Some("Rp"));
    }

    #[tokio::test]
    async fn test_get_all() {
        let repo = setup().await;

        repo.set("store_name", "Toko Tani").await.unwrap();
        repo.set("whatsapp_number", "6281234567890").await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("store_name").map(String::as_str), Some("Toko Tani"));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;

        repo.set("tagline", "Hasil bumi terbaik").await.unwrap();
        repo.delete("tagline").await.unwrap();
        assert!(repo.get("tagline").await.unwrap().is_none());
    }
}
