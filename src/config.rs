use serde::Deserialize;

use crate::models::{BlockConfig, Dictionary};
use crate::services::visibility::DeviceClass;

/// Config key holding the store view code that scopes persisted history
pub const STORE_VIEW_CODE_KEY: &str = "headers.cs.Magento-Store-View-Code";
pub const ENVIRONMENT_ID_KEY: &str = "headers.cs.Magento-Environment-Id";
pub const API_KEY_KEY: &str = "headers.cs.x-api-key";
pub const COMMERCE_ENDPOINT_KEY: &str = "commerce-endpoint";

/// Read access to dotted configuration keys
pub trait ConfigReader: Send + Sync {
    fn config_value(&self, key: &str) -> Option<String>;
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Store view code, used as the history scope key
    #[serde(default = "default_store_view_code")]
    pub store_view_code: String,

    /// Recommendations GraphQL endpoint
    pub commerce_endpoint: String,

    #[serde(default)]
    pub environment_id: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Redis connection URL; history lives in process memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Storage session namespace
    #[serde(default)]
    pub session_id: Option<String>,

    /// Prefix applied to storefront links
    #[serde(default)]
    pub root_path: String,

    /// Viewport width reported by the page at startup
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Widths at or below this are classified as mobile
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: u32,

    /// `typeid` row of the block table
    #[serde(default)]
    pub block_typeid: Option<String>,

    #[serde(default)]
    pub label_add_to_cart: Option<String>,

    #[serde(default)]
    pub label_select_options: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_store_view_code() -> String {
    "default".to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_mobile_breakpoint() -> u32 {
    900
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Static device classification, evaluated once at startup
    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::classify(self.viewport_width, self.mobile_breakpoint)
    }

    /// Block table rows as the page would author them
    pub fn block_config(&self) -> BlockConfig {
        BlockConfig::from_rows(
            self.block_typeid
                .iter()
                .map(|type_id| ("typeid".to_string(), type_id.clone())),
        )
    }

    /// Labels for the footer actions, falling back to the stock placeholders
    pub fn dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::default();
        if let Some(label) = &self.label_add_to_cart {
            dictionary.add_to_cart = label.clone();
        }
        if let Some(label) = &self.label_select_options {
            dictionary.select_options = label.clone();
        }
        dictionary
    }
}

impl ConfigReader for Config {
    fn config_value(&self, key: &str) -> Option<String> {
        match key {
            STORE_VIEW_CODE_KEY => Some(self.store_view_code.clone()),
            ENVIRONMENT_ID_KEY => self.environment_id.clone(),
            API_KEY_KEY => self.api_key.clone(),
            COMMERCE_ENDPOINT_KEY => Some(self.commerce_endpoint.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        store_view_code: "default".to_string(),
        commerce_endpoint: "http://localhost:8080/graphql".to_string(),
        environment_id: None,
        api_key: None,
        redis_url: None,
        session_id: None,
        root_path: String::new(),
        viewport_width: default_viewport_width(),
        mobile_breakpoint: default_mobile_breakpoint(),
        block_typeid: None,
        label_add_to_cart: None,
        label_select_options: None,
        host: default_host(),
        port: default_port(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_view_code_lookup() {
        let mut config = test_config();
        config.store_view_code = "en_us".to_string();
        assert_eq!(
            config.config_value(STORE_VIEW_CODE_KEY),
            Some("en_us".to_string())
        );
    }

    #[test]
    fn test_unknown_key_is_none() {
        assert_eq!(test_config().config_value("headers.all.Store"), None);
    }

    #[test]
    fn test_device_class_breakpoint() {
        let mut config = test_config();
        config.viewport_width = 900;
        assert_eq!(config.device_class(), DeviceClass::Mobile);
        config.viewport_width = 901;
        assert_eq!(config.device_class(), DeviceClass::NonMobile);
    }

    #[test]
    fn test_block_config_type_id() {
        let mut config = test_config();
        assert_eq!(config.block_config().get("typeid"), None);
        config.block_typeid = Some("most-viewed".to_string());
        assert_eq!(config.block_config().get("typeid"), Some("most-viewed"));
    }

    #[test]
    fn test_dictionary_overrides() {
        let mut config = test_config();
        config.label_select_options = Some("Choose".to_string());
        let dictionary = config.dictionary();
        assert_eq!(dictionary.add_to_cart, "Add to Cart");
        assert_eq!(dictionary.select_options, "Choose");
    }
}
