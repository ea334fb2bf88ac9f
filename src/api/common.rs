//! Shared helpers for API request DTOs

use serde::{Deserialize, Deserializer};

/// Distinguish "field absent" from "field set to null" in PATCH-style
/// bodies. Use together with `#[serde(default)]`: absent stays `None`,
/// an explicit `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "double_option")]
        category_id: Option<Option<i64>>,
    }

    #[test]
    fn test_absent_vs_null_vs_value() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.category_id, None);

        let null: Body = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(null.category_id, Some(None));

        let value: Body = serde_json::from_str(r#"{"category_id": 5}"#).unwrap();
        assert_eq!(value.category_id, Some(Some(5)));
    }
}
