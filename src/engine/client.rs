//! Engine Hub HTTP client
//!
//! Two endpoints, both POST, both slow: content generation (5 minute
//! timeout) and image generation (3 minutes). Hub responses are not
//! perfectly consistent about field casing, so deserialization accepts
//! both `title` and `Title`, `url` and `URL`, and so on.
//!
//! No retries and no circuit breaker. A generation call is expensive on
//! the hub side; the admin retries by hand if they want another attempt.

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors from the engine bridge.
///
/// Display strings are user-facing and shown verbatim in the admin UI.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The hub did not answer within the timeout
    #[error("Mesin AI tidak merespons dalam batas waktu. Silakan coba lagi.")]
    Timeout,

    /// Could not reach the hub at all
    #[error("Tidak dapat terhubung ke mesin AI. Periksa koneksi Engine Hub.")]
    Connect,

    /// The hub answered with a non-success HTTP status
    #[error("Mesin AI mengembalikan kesalahan (HTTP {status}).")]
    Upstream { status: u16 },

    /// The hub processed the request but reported generation failure
    #[error("Pembuatan konten gagal: {0}")]
    Failed(String),

    /// The hub answered with a body this client cannot make sense of
    #[error("Respons mesin AI tidak dapat dibaca: {0}")]
    Decode(String),

    /// Anything else
    #[error("Kesalahan internal pada jembatan mesin AI: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout
        } else if err.is_connect() {
            EngineError::Connect
        } else {
            EngineError::Internal(anyhow::anyhow!(err))
        }
    }
}

/// Request body for content generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub content_type: String,
    pub category: String,
    pub outline: String,
    pub language: String,
}

/// Request body for image generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateImagesRequest<'a> {
    product_name: &'a str,
    product_description: &'a str,
    product_slug: &'a str,
}

/// Generated content returned by the hub
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
}

/// One generated image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedImage {
    pub url: String,
    pub role: Option<String>,
    pub alt: Option<String>,
}

// ============================================================================
// Wire types (tolerant of the hub's casing inconsistencies)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    content: Option<ContentFields>,
    #[serde(default, alias = "Title")]
    title: Option<String>,
    #[serde(default, alias = "Body")]
    body: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentFields {
    #[serde(default, alias = "Title")]
    title: Option<String>,
    #[serde(default, alias = "Body")]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    images: Vec<ImageFields>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageFields {
    #[serde(default, alias = "URL")]
    url: Option<String>,
    #[serde(default, alias = "localPath", alias = "LocalPath")]
    local_path: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

fn is_failed_status(status: &str) -> bool {
    matches!(status, "FAILED" | "FAILED_VALIDATION")
}

impl ContentEnvelope {
    fn into_content(self) -> Result<GeneratedContent, EngineError> {
        if let Some(status) = self.status.as_deref() {
            if is_failed_status(status) {
                let detail = self.error.unwrap_or_else(|| status.to_string());
                return Err(EngineError::Failed(detail));
            }
        }

        let (title, body) = match self.content {
            Some(fields) => (fields.title, fields.body),
            None => (self.title, self.body),
        };

        let title = title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| EngineError::Decode("missing title".to_string()))?;
        let body = body
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| EngineError::Decode("missing body".to_string()))?;

        Ok(GeneratedContent { title, body })
    }
}

impl ImageFields {
    fn into_image(self) -> Option<GeneratedImage> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .or(self.local_path.filter(|p| !p.trim().is_empty()))?;
        Some(GeneratedImage {
            url,
            role: self.role,
            alt: self.alt,
        })
    }
}

/// Engine Hub client
pub struct EngineClient {
    http: reqwest::Client,
    hub_url: String,
    content_timeout: Duration,
    image_timeout: Duration,
}

impl EngineClient {
    /// Build a client from configuration.
    ///
    /// The timeouts are applied per request rather than on the client, so
    /// the two endpoints can differ.
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            hub_url: config.hub_url.trim_end_matches('/').to_string(),
            content_timeout: Duration::from_secs(config.content_timeout_secs),
            image_timeout: Duration::from_secs(config.image_timeout_secs),
        })
    }

    /// Generate content (product description or blog article body).
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GeneratedContent, EngineError> {
        let url = format!("{}/api/engine/ai/generate-v2", self.hub_url);

        tracing::info!(content_type = %request.content_type, "Requesting content generation");

        let response = self
            .http
            .post(&url)
            .timeout(self.content_timeout)
            .json(request)
            .send()
            .await
            .map_err(EngineError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Upstream {
                status: status.as_u16(),
            });
        }

        let envelope: ContentEnvelope = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        envelope.into_content()
    }

    /// Generate product images.
    pub async fn generate_product_images(
        &self,
        product_name: &str,
        product_description: &str,
        product_slug: &str,
    ) -> Result<Vec<GeneratedImage>, EngineError> {
        let url = format!("{}/api/engine/ai/generate-product-images", self.hub_url);

        tracing::info!(slug = %product_slug, "Requesting image generation");

        let response = self
            .http
            .post(&url)
            .timeout(self.image_timeout)
            .json(&GenerateImagesRequest {
                product_name,
                product_description,
                product_slug,
            })
            .send()
            .await
            .map_err(EngineError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Upstream {
                status: status.as_u16(),
            });
        }

        let envelope: ImagesEnvelope = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        if let Some(status) = envelope.status.as_deref() {
            if is_failed_status(status) {
                let detail = envelope.error.unwrap_or_else(|| status.to_string());
                return Err(EngineError::Failed(detail));
            }
        }

        Ok(envelope
            .images
            .into_iter()
            .filter_map(ImageFields::into_image)
            .collect())
    }
}
