//! Product generation pipeline
//!
//! Turns a short merchandising brief into a full draft: outline, engine
//! call for the description, HTML cleanup, engine call for images, and a
//! fixed QC checklist over the result. The caller decides what to do with
//! a FAIL; the pipeline never silently drops a draft.

use crate::engine::client::{
    EngineClient, EngineError, GenerateContentRequest, GeneratedImage,
};
use crate::services::slug::generate_slug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[a-zA-Z]*\n?").unwrap_or_else(|e| panic!("invalid fence regex: {}", e))
});

static H1_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<h1[^>]*>").unwrap_or_else(|e| panic!("invalid h1 regex: {}", e))
});

static H1_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</h1>").unwrap_or_else(|e| panic!("invalid h1 regex: {}", e))
});

static PLACEHOLDER_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:image|gambar)[^\]]*\]|\{\{[^{}]*(?:image|gambar)[^{}]*\}\}")
        .unwrap_or_else(|e| panic!("invalid placeholder regex: {}", e))
});

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n{3,}").unwrap_or_else(|e| panic!("invalid blank-run regex: {}", e))
});

/// Merchandising brief the admin fills in before generation
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProductBrief {
    pub name: String,
    /// Category display name, used verbatim in the outline
    pub category: String,
    #[serde(default)]
    pub variant: Option<String>,
    /// Free-text price range ("Rp50.000 - Rp100.000")
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// QC verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QcStatus {
    Pass,
    Fail,
}

/// Result of the QC checklist
#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub status: QcStatus,
    /// Names of the checks that did not pass
    pub failed_checks: Vec<String>,
}

impl QcReport {
    pub fn passed(&self) -> bool {
        self.status == QcStatus::Pass
    }
}

/// Full output of the generation pipeline
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedProduct {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub images: Vec<GeneratedImage>,
    pub qc: QcReport,
}

/// Product generation pipeline
pub struct ProductGenerator {
    engine: Arc<EngineClient>,
}

impl ProductGenerator {
    pub fn new(engine: Arc<EngineClient>) -> Self {
        Self { engine }
    }

    /// Run the whole pipeline for one product brief.
    pub async fn generate(&self, brief: &ProductBrief) -> Result<GeneratedProduct, EngineError> {
        let outline = build_outline(brief);

        let content = self
            .engine
            .generate_content(&GenerateContentRequest {
                content_type: "product_description".to_string(),
                category: brief.category.clone(),
                outline,
                language: "id".to_string(),
            })
            .await?;

        let description = tidy_html(&content.body);
        let slug = generate_slug(&content.title);

        let images = self
            .engine
            .generate_product_images(&brief.name, &description, &slug)
            .await?;

        let primary_keyword = brief.keywords.first().map(String::as_str);
        let qc = run_qc(&content.title, &description, primary_keyword, &images);

        tracing::info!(
            slug = %slug,
            qc = ?qc.status,
            image_count = images.len(),
            "Product generation finished"
        );

        Ok(GeneratedProduct {
            title: content.title,
            slug,
            description,
            images,
            qc,
        })
    }
}

/// Build the engine outline from the brief.
///
/// One line per filled-in field; the engine treats it as loose guidance,
/// not a schema.
pub fn build_outline(brief: &ProductBrief) -> String {
    let mut lines = vec![
        format!("Produk: {}", brief.name),
        format!("Kategori: {}", brief.category),
    ];
    if let Some(ref variant) = brief.variant {
        if !variant.trim().is_empty() {
            lines.push(format!("Varian: {}", variant));
        }
    }
    if let Some(ref price_range) = brief.price_range {
        if !price_range.trim().is_empty() {
            lines.push(format!("Kisaran harga: {}", price_range));
        }
    }
    if !brief.keywords.is_empty() {
        lines.push(format!("Kata kunci: {}", brief.keywords.join(", ")));
    }
    lines.join("\n")
}

/// Clean up engine HTML output.
///
/// The engine sometimes wraps the body in markdown fences, emits an `<h1>`
/// that would clash with the page heading, or leaves image placeholders in
/// the prose.
pub fn tidy_html(body: &str) -> String {
    let body = CODE_FENCE.replace_all(body, "");
    let body = H1_OPEN.replace_all(&body, "<h2>");
    let body = H1_CLOSE.replace_all(&body, "</h2>");
    let body = PLACEHOLDER_IMAGE.replace_all(&body, "");
    let body = BLANK_RUN.replace_all(&body, "\n\n");
    body.trim().to_string()
}

/// Run the fixed QC checklist over a generated draft.
pub fn run_qc(
    title: &str,
    body: &str,
    primary_keyword: Option<&str>,
    images: &[GeneratedImage],
) -> QcReport {
    let mut failed_checks = Vec::new();

    if title.trim().is_empty() {
        failed_checks.push("title_empty".to_string());
    }
    if body.trim().is_empty() {
        failed_checks.push("body_empty".to_string());
    }
    if let Some(keyword) = primary_keyword {
        if !keyword.trim().is_empty()
            && !body.to_lowercase().contains(&keyword.trim().to_lowercase())
        {
            failed_checks.push("primary_keyword_missing".to_string());
        }
    }
    if PLACEHOLDER_IMAGE.is_match(body) {
        failed_checks.push("placeholder_markers_remain".to_string());
    }
    if !images.iter().any(|i| !i.url.trim().is_empty()) {
        failed_checks.push("no_usable_image".to_string());
    }

    QcReport {
        status: if failed_checks.is_empty() {
            QcStatus::Pass
        } else {
            QcStatus::Fail
        },
        failed_checks,
    }
}
