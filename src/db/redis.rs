use redis::AsyncCommands;
use redis::Client;

use super::storage::DurableStorage;
use crate::error::AppResult;

/// Creates a Redis client for session storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Session storage backed by Redis
///
/// Every key is namespaced under `session:{session_id}:` so several shoppers
/// can share one Redis instance.
#[derive(Clone)]
pub struct RedisStorage {
    redis_client: Client,
    session_id: String,
}

impl RedisStorage {
    pub fn new(redis_client: Client, session_id: impl Into<String>) -> Self {
        Self {
            redis_client,
            session_id: session_id.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("session:{}:{}", self.session_id, key)
    }
}

#[async_trait::async_trait]
impl DurableStorage for RedisStorage {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(self.scoped(key)).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(self.scoped(key), value).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.scoped(key)).await?;
        Ok(())
    }
}
