//! Service context - dependency container for the presence services
//!
//! Holds the record store, change bus, presence cache, clock and tunables.

use std::sync::Arc;

use presence_cache::PresenceCache;
use presence_common::PresenceSettings;
use presence_core::{ChangeBus, Clock, RecordStore, StatusEvaluator, SystemClock};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // External collaborators
    store: Arc<dyn RecordStore>,
    bus: Arc<dyn ChangeBus>,

    // Local state
    cache: Arc<PresenceCache>,
    clock: Arc<dyn Clock>,

    settings: PresenceSettings,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        store: Arc<dyn RecordStore>,
        bus: Arc<dyn ChangeBus>,
        cache: Arc<PresenceCache>,
        clock: Arc<dyn Clock>,
        settings: PresenceSettings,
    ) -> Self {
        Self {
            store,
            bus,
            cache,
            clock,
            settings,
        }
    }

    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === External collaborators ===

    /// Get the record store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Get the change bus
    pub fn bus(&self) -> &Arc<dyn ChangeBus> {
        &self.bus
    }

    // === Local state ===

    /// Get the presence cache
    pub fn cache(&self) -> &Arc<PresenceCache> {
        &self.cache
    }

    /// Get the clock
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // === Settings ===

    pub fn settings(&self) -> &PresenceSettings {
        &self.settings
    }

    /// Evaluator configured with the staleness threshold
    pub fn evaluator(&self) -> StatusEvaluator {
        StatusEvaluator::new(self.settings.offline_threshold_minutes)
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("store", &"RecordStore")
            .field("bus", &"ChangeBus")
            .field("cache", &self.cache.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    store: Option<Arc<dyn RecordStore>>,
    bus: Option<Arc<dyn ChangeBus>>,
    cache: Option<Arc<PresenceCache>>,
    clock: Option<Arc<dyn Clock>>,
    settings: Option<PresenceSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn bus(mut self, bus: Arc<dyn ChangeBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn cache(mut self, cache: Arc<PresenceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn settings(mut self, settings: PresenceSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if the store or bus is missing, or
    /// if a timing or buffer setting is zero
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let settings = self.settings.unwrap_or_default();
        validate_settings(&settings)?;

        Ok(ServiceContext::new(
            self.store
                .ok_or_else(|| ServiceError::validation("store is required"))?,
            self.bus
                .ok_or_else(|| ServiceError::validation("bus is required"))?,
            self.cache.unwrap_or_default(),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            settings,
        ))
    }
}

// Ranges are enforced when loading from the environment; here only values
// that would break the timers and channels are rejected.
fn validate_settings(settings: &PresenceSettings) -> ServiceResult<()> {
    if settings.activity_debounce_ms == 0 {
        return Err(ServiceError::validation("activity debounce must be non-zero"));
    }
    if settings.status_check_interval_ms == 0 {
        return Err(ServiceError::validation("status check interval must be non-zero"));
    }
    if settings.change_buffer == 0 {
        return Err(ServiceError::validation("change buffer must be non-zero"));
    }
    Ok(())
}
