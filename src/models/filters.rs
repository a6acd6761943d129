use serde::Serialize;
use std::collections::BTreeMap;

/// Key/value rows authored in the block table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockConfig(BTreeMap<String, String>);

impl BlockConfig {
    /// Builds the config from raw rows, normalizing keys to class-name form
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = rows
            .into_iter()
            .map(|(key, value)| (to_class_name(key.as_ref()), value.into()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Lowercases and collapses every run of non-alphanumerics into a single `-`
fn to_class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Per-block filters, fixed for the lifetime of the block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
}

impl From<&BlockConfig> for Filters {
    fn from(config: &BlockConfig) -> Self {
        let type_id = config
            .get("typeid")
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self { type_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_normalized() {
        let config = BlockConfig::from_rows([("Type ID", "x"), ("  Page--Size ", "4")]);
        assert_eq!(config.get("type-id"), Some("x"));
        assert_eq!(config.get("page-size"), Some("4"));
    }

    #[test]
    fn test_filters_from_typeid_row() {
        let config = BlockConfig::from_rows([("TypeId", "most-viewed")]);
        let filters = Filters::from(&config);
        assert_eq!(filters.type_id.as_deref(), Some("most-viewed"));
    }

    #[test]
    fn test_empty_typeid_is_ignored() {
        let config = BlockConfig::from_rows([("typeid", "")]);
        assert_eq!(Filters::from(&config), Filters::default());
    }

    #[test]
    fn test_filters_serialize_without_unset_fields() {
        let json = serde_json::to_value(Filters::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
