use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::AppResult;

/// String-valued key/value storage scoped to one shopper session
///
/// Mirrors the browser's local storage contract: get, set and remove.
#[async_trait::async_trait]
pub trait DurableStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_item(&self, key: &str, value: String) -> AppResult<()>;

    async fn remove_item(&self, key: &str) -> AppResult<()>;
}

/// Process-local storage, used when no Redis URL is configured and in tests
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated with `items`
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let items = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            items: RwLock::new(items),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.items.read().await.contains_key(key)
    }
}

#[async_trait::async_trait]
impl DurableStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
