use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use recs_block::api::{create_router, AppState};
use recs_block::config::Config;
use recs_block::db::{create_redis_client, DurableStorage, MemoryStorage, RedisStorage};
use recs_block::services::providers::CommerceRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // History storage: Redis when configured, process memory otherwise
    let storage: Arc<dyn DurableStorage> = match &config.redis_url {
        Some(redis_url) => {
            let session_id = config
                .session_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            tracing::info!(session_id = %session_id, "Using Redis history storage");
            Arc::new(RedisStorage::new(create_redis_client(redis_url)?, session_id))
        }
        None => {
            tracing::info!("Using in-memory history storage");
            Arc::new(MemoryStorage::new())
        }
    };

    let renderer = Arc::new(CommerceRenderer::new(&config, config.dictionary())?);

    let state = AppState::mount(&config, storage, renderer);
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Page host listening");
    axum::serve(listener, app).await?;

    Ok(())
}
