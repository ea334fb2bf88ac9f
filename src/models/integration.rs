//! Integration model
//!
//! An integration row holds the enabled flag and JSON configuration for an
//! external channel: the WhatsApp order line, marketplace storefronts, and
//! the AI Engine Hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Whatsapp,
    Tokopedia,
    Shopee,
    Engine,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Whatsapp => "whatsapp",
            Provider::Tokopedia => "tokopedia",
            Provider::Shopee => "shopee",
            Provider::Engine => "engine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "whatsapp" => Some(Provider::Whatsapp),
            "tokopedia" => Some(Provider::Tokopedia),
            "shopee" => Some(Provider::Shopee),
            "engine" => Some(Provider::Engine),
            _ => None,
        }
    }

    /// All known providers
    pub fn all() -> &'static [Provider] {
        &[
            Provider::Whatsapp,
            Provider::Tokopedia,
            Provider::Shopee,
            Provider::Engine,
        ]
    }

    /// Whether this provider is a marketplace storefront
    pub fn is_marketplace(&self) -> bool {
        matches!(self, Provider::Tokopedia | Provider::Shopee)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integration entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    /// Provider kind
    pub provider: Provider,
    /// Whether the integration is active
    pub enabled: bool,
    /// Provider-specific configuration
    pub config: serde_json::Value,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Integration {
    /// Create a disabled integration with empty config
    pub fn disabled(provider: Provider) -> Self {
        Self {
            provider,
            enabled: false,
            config: serde_json::Value::Object(Default::default()),
            updated_at: Utc::now(),
        }
    }

    /// Read a string field from the config
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roundtrip() {
        for provider in Provider::all() {
            assert_eq!(Provider::parse(provider.as_str()), Some(*provider));
        }
        assert_eq!(Provider::parse("lazada"), None);
    }

    #[test]
    fn test_is_marketplace() {
        assert!(Provider::Tokopedia.is_marketplace());
        assert!(Provider::Shopee.is_marketplace());
        assert!(!Provider::Whatsapp.is_marketplace());
        assert!(!Provider::Engine.is_marketplace());
    }

    #[test]
    fn test_config_str() {
        let mut integration = Integration::disabled(Provider::Whatsapp);
        integration.config = serde_json::json!({"phone": "6281234567890"});

        assert_eq!(integration.config_str("phone"), Some("6281234567890"));
        assert_eq!(integration.config_str("missing"), None);
    }
}
