//! Test helpers for integration tests
//!
//! Provides an in-process cluster of presence nodes and utilities for
//! tests that need live PostgreSQL and Redis.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use presence_cache::LocalChangeBus;
use presence_common::{AppConfig, PresenceSettings};
use presence_core::ManualClock;
use presence_db::MemoryStatusStore;
use presence_service::{NotifyingStore, PresenceService, ServiceContext};

use crate::fixtures::t0;

/// Nodes sharing one record store, one change bus and one clock.
///
/// Each node gets its own presence cache, like separate processes would.
/// Writes through any node are announced on the bus.
pub struct TestCluster {
    pub store: Arc<MemoryStatusStore>,
    pub bus: Arc<LocalChangeBus>,
    pub clock: Arc<ManualClock>,
}

impl TestCluster {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStatusStore::new()),
            bus: Arc::new(LocalChangeBus::new(64)),
            clock: Arc::new(ManualClock::new(t0())),
        }
    }

    /// Start a node with the given settings
    pub fn node(&self, settings: PresenceSettings) -> Result<PresenceService> {
        let store = NotifyingStore::new(self.store.clone(), self.bus.clone());
        let ctx = ServiceContext::builder()
            .store(Arc::new(store))
            .bus(self.bus.clone())
            .clock(self.clock.clone())
            .settings(settings)
            .build()?;
        Ok(PresenceService::new(&ctx))
    }
}

impl Default for TestCluster {
    fn default() -> Self {
        Self::new()
    }
}

/// Let spawned tasks run. Under a paused runtime this also advances time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    // Load from environment or use defaults
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    Ok(config)
}

/// Helper to check if test environment is available
pub fn check_test_env() -> bool {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}

/// Poll `condition` every 50ms until it holds or `timeout` passes
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
