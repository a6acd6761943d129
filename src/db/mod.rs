pub mod history;
pub mod redis;
pub mod storage;

pub use history::{HistoryKey, HistoryKind, HistoryStore};
pub use self::redis::{create_redis_client, RedisStorage};
pub use storage::{DurableStorage, MemoryStorage};
