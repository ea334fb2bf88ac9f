//! Slug generation
//!
//! Shared by categories, products, and posts. A base slug is derived from
//! the display name; collisions are resolved by appending an incrementing
//! numeric suffix (`beras`, `beras-2`, `beras-3`, ...).

use anyhow::Result;
use std::future::Future;

/// Maximum number of suffix attempts before giving up
const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Generate a URL-friendly slug from a name.
///
/// Lowercases, maps separators and ASCII punctuation to hyphens, keeps
/// non-ASCII characters as-is, and collapses hyphen runs.
pub fn generate_slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c == ' ' || c == '_' || c == '-' {
                '-'
            } else if !c.is_ascii() {
                // Keep non-ASCII characters (local product names)
                c
            } else {
                '-'
            }
        })
        .collect();

    // Remove consecutive hyphens and trim hyphens from ends
    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Resolve a unique slug by probing `exists` with incrementing suffixes.
///
/// The first attempt is the base slug itself; subsequent attempts append
/// `-2`, `-3`, and so on.
pub async fn ensure_unique_slug<F, Fut>(base: &str, exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let base = if base.is_empty() { "item" } else { base };

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = if attempt == 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, attempt)
        };

        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    anyhow::bail!("Could not find a unique slug for '{}'", base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(generate_slug("Beras Organik 5kg"), "beras-organik-5kg");
        assert_eq!(generate_slug("Pupuk NPK 16-16-16"), "pupuk-npk-16-16-16");
    }

    #[test]
    fn test_generate_slug_strips_punctuation() {
        assert_eq!(generate_slug("Benih Jagung (Hibrida)!"), "benih-jagung-hibrida");
        assert_eq!(generate_slug("--Promo--"), "promo");
    }

    #[test]
    fn test_generate_slug_collapses_hyphens() {
        assert_eq!(generate_slug("a  -  b"), "a-b");
    }

    #[test]
    fn test_generate_slug_empty() {
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[tokio::test]
    async fn test_ensure_unique_no_collision() {
        let taken: HashSet<String> = HashSet::new();
        let slug = ensure_unique_slug("beras", |s| {
            let taken = taken.clone();
            async move { Ok(taken.contains(&s)) }
        })
        .await
        .unwrap();
        assert_eq!(slug, "beras");
    }

    #[tokio::test]
    async fn test_ensure_unique_appends_suffix() {
        let taken: HashSet<String> =
            ["beras".to_string(), "beras-2".to_string()].into_iter().collect();
        let slug = ensure_unique_slug("beras", |s| {
            let taken = taken.clone();
            async move { Ok(taken.contains(&s)) }
        })
        .await
        .unwrap();
        assert_eq!(slug, "beras-3");
    }

    #[tokio::test]
    async fn test_ensure_unique_empty_base_falls_back() {
        let slug = ensure_unique_slug("", |_| async { Ok(false) }).await.unwrap();
        assert_eq!(slug, "item");
    }

    #[tokio::test]
    async fn test_ensure_unique_gives_up_eventually() {
        let result = ensure_unique_slug("beras", |_| async { Ok(true) }).await;
        assert!(result.is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// Generated slugs never contain characters outside the
            /// URL-friendly set (for ASCII input) and never have leading,
            /// trailing, or doubled hyphens.
            #[test]
            fn slug_is_url_friendly(name in "[ -~]{0,40}") {
                let slug = generate_slug(&name);
                prop_assert!(slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
            }

            /// Slug generation is idempotent: slugifying a slug changes
            /// nothing.
            #[test]
            fn slug_is_idempotent(name in "[a-zA-Z0-9 ]{0,40}") {
                let once = generate_slug(&name);
                let twice = generate_slug(&once);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
