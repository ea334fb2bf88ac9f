//! Configuration management
//!
//! Loads configuration for the Agrimart server from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Engine Hub configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (storefront frontend)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration (SQLite)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/agrimart.db".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_capacity")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_entries: default_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_capacity() -> u64 {
    10_000
}

/// Engine Hub configuration
///
/// The Engine Hub is the external AI service used to generate product
/// descriptions and product images. Both calls are bounded by client-side
/// timeouts; there are no retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the Engine Hub
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    /// Timeout for content generation calls, in seconds (default 5 minutes)
    #[serde(default = "default_content_timeout")]
    pub content_timeout_secs: u64,
    /// Timeout for image generation calls, in seconds (default 3 minutes)
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            content_timeout_secs: default_content_timeout(),
            image_timeout_secs: default_image_timeout(),
        }
    }
}

fn default_hub_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_content_timeout() -> u64 {
    300
}

fn default_image_timeout() -> u64 {
    180
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - AGRIMART_SERVER_HOST
    /// - AGRIMART_SERVER_PORT
    /// - AGRIMART_SERVER_CORS_ORIGIN
    /// - AGRIMART_DATABASE_URL
    /// - AGRIMART_CACHE_TTL_SECONDS
    /// - AGRIMART_ENGINE_HUB_URL
    /// - AGRIMART_ENGINE_CONTENT_TIMEOUT_SECS
    /// - AGRIMART_ENGINE_IMAGE_TIMEOUT_SECS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("AGRIMART_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("AGRIMART_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("AGRIMART_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("AGRIMART_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("AGRIMART_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(hub_url) = std::env::var("AGRIMART_ENGINE_HUB_URL") {
            self.engine.hub_url = hub_url;
        }
        if let Ok(secs) = std::env::var("AGRIMART_ENGINE_CONTENT_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.engine.content_timeout_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("AGRIMART_ENGINE_IMAGE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.engine.image_timeout_secs = secs;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
