//! Visitor event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of visitor events recorded by the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A page was viewed
    PageView,
    /// A WhatsApp checkout link was requested
    WhatsappClick,
    /// A marketplace checkout link was requested
    MarketplaceClick,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::WhatsappClick => "whatsapp_click",
            EventType::MarketplaceClick => "marketplace_click",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "page_view" => Some(EventType::PageView),
            "whatsapp_click" => Some(EventType::WhatsappClick),
            "marketplace_click" => Some(EventType::MarketplaceClick),
            _ => None,
        }
    }
}

/// A recorded visitor event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorEvent {
    /// Unique identifier
    pub id: i64,
    /// Event kind
    pub event_type: EventType,
    /// Page path the event was recorded on
    pub path: String,
    /// Product slug, for product-related events
    pub product_slug: Option<String>,
    /// HTTP referrer
    pub referrer: Option<String>,
    /// Visitor user agent
    pub user_agent: Option<String>,
    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for recording a visitor event
#[derive(Debug, Clone)]
pub struct RecordEventInput {
    pub event_type: EventType,
    pub path: String,
    pub product_slug: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl RecordEventInput {
    pub fn new(event_type: EventType, path: impl Into<String>) -> Self {
        Self {
            event_type,
            path: path.into(),
            product_slug: None,
            referrer: None,
            user_agent: None,
        }
    }

    pub fn with_product(mut self, slug: impl Into<String>) -> Self {
        self.product_slug = Some(slug.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_roundtrip() {
        for event_type in [
            EventType::PageView,
            EventType::WhatsappClick,
            EventType::MarketplaceClick,
        ] {
            assert_eq!(EventType::parse(event_type.as_str()), Some(event_type));
        }
        assert_eq!(EventType::parse("purchase"), None);
    }

    #[test]
    fn test_record_input_builder() {
        let input = RecordEventInput::new(EventType::WhatsappClick, "/checkout/whatsapp")
            .with_product("beras-organik-5kg");

        assert_eq!(input.event_type, EventType::WhatsappClick);
        assert_eq!(input.product_slug.as_deref(), Some("beras-organik-5kg"));
    }
}
