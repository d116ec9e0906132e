//! Agent bootstrap
//!
//! Connects the external collaborators and hands a ready service to the console.

use std::sync::Arc;

use presence_cache::{Publisher, RedisChangeBus, RedisPool};
use presence_common::{AppConfig, AppError};
use presence_core::SubjectId;
use presence_db::{create_pool, DatabaseConfig, PgStatusStore};
use presence_service::{NotifyingStore, PresenceService, ServiceContextBuilder};
use tokio::io::BufReader;

use crate::console::Console;

/// Initialize all dependencies and create the `PresenceService`
pub async fn create_service(config: &AppConfig) -> Result<PresenceService, AppError> {
    // Record store
    tracing::info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    let pg_store = PgStatusStore::new(pool);
    pg_store
        .ensure_schema()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    // Change bus
    tracing::info!("Connecting to Redis...");
    let redis_pool = RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    redis_pool
        .health_check()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    let bus = RedisChangeBus::new(&config.redis.url, config.presence.change_buffer)
        .map_err(|e| AppError::Cache(e.to_string()))?;
    tracing::info!("Redis connection established");

    // Writes made here are announced so other agents see them
    let store = NotifyingStore::new(Arc::new(pg_store), Arc::new(Publisher::new(redis_pool)));

    let ctx = ServiceContextBuilder::new()
        .store(Arc::new(store))
        .bus(Arc::new(bus))
        .settings(config.presence.clone())
        .build()
        .map_err(AppError::from)?;

    let service = PresenceService::new(&ctx);
    if let Some(subject) = &config.presence.subject_id {
        service.set_actor(Some(SubjectId::new(subject.as_str())?));
    }

    Ok(service)
}

/// Run the agent until `quit`, end of input, or Ctrl-C
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let service = create_service(&config).await?;

    let mut console = Console::new(
        service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );

    tokio::select! {
        result = console.run() => {
            result.map_err(AppError::internal)?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    console.shutdown().await;
    tracing::info!("Presence agent stopped");
    Ok(())
}
