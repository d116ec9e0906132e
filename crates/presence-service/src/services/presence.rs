//! Presence service
//!
//! Facade over the writer, debouncer and subscription registry. This is what
//! the rest of an application calls.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use presence_cache::PresenceCache;
use presence_core::{Clock, SubjectId};

use super::context::ServiceContext;
use super::debouncer::ActivityDebouncer;
use super::probe::StatusProbe;
use super::registry::{SubscriptionHandle, SubscriptionRegistry};
use super::writer::{PresenceWriter, WriteOutcome};

/// Presence service
pub struct PresenceService {
    writer: Arc<PresenceWriter>,
    debouncer: ActivityDebouncer,
    registry: Arc<SubscriptionRegistry>,
    probe: StatusProbe,
    cache: Arc<PresenceCache>,
    clock: Arc<dyn Clock>,
}

impl PresenceService {
    /// Create a new PresenceService
    pub fn new(ctx: &ServiceContext) -> Self {
        let settings = ctx.settings();
        let writer = Arc::new(PresenceWriter::new(ctx.store().clone()));
        let probe = StatusProbe::new(ctx.store().clone(), ctx.clock().clone(), ctx.evaluator());
        let debouncer = ActivityDebouncer::new(
            writer.clone(),
            ctx.clock().clone(),
            settings.activity_debounce(),
        );
        let registry = Arc::new(SubscriptionRegistry::new(
            ctx.bus().clone(),
            probe.clone(),
            ctx.cache().clone(),
            settings.status_check_interval(),
        ));

        Self {
            writer,
            debouncer,
            registry,
            probe,
            cache: ctx.cache().clone(),
            clock: ctx.clock().clone(),
        }
    }

    // === Actor ===

    /// Set (login) or clear (logout) the subject local activity belongs to
    pub fn set_actor(&self, actor: Option<SubjectId>) {
        match &actor {
            Some(subject_id) => info!(subject_id = %subject_id, "Actor set"),
            None => info!("Actor cleared"),
        }
        self.debouncer.set_actor(actor);
    }

    pub fn actor(&self) -> Option<SubjectId> {
        self.debouncer.actor()
    }

    // === Writes ===

    /// Signal local activity; debounced into one online write
    pub fn mark_active(&self) {
        self.debouncer.mark_active();
    }

    /// Write the actor's status immediately.
    ///
    /// Returns `None` without an actor. Store failures are logged, not returned.
    #[instrument(skip(self))]
    pub async fn set_status(&self, online: bool) -> Option<WriteOutcome> {
        let actor = self.actor()?;
        Some(self.writer.write(&actor, online, self.clock.now()).await)
    }

    // === Reads ===

    /// Fresh fetch and evaluation, bypassing the cache.
    ///
    /// The result is cached on success; any store failure reads as offline.
    #[instrument(skip(self))]
    pub async fn check_status(&self, subject_id: &SubjectId) -> bool {
        match self.probe.probe(subject_id).await {
            Ok(online) => {
                self.cache.set(subject_id.clone(), online);
                online
            }
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "Failed to check user status");
                false
            }
        }
    }

    /// Last cached evaluation for a subject
    pub fn cached_status(&self, subject_id: &SubjectId) -> Option<bool> {
        self.cache.get(subject_id)
    }

    pub fn cache(&self) -> &Arc<PresenceCache> {
        &self.cache
    }

    // === Subscriptions ===

    /// Keep the cache in sync for a subject until the handle is cancelled
    pub async fn subscribe(&self, subject_id: SubjectId) -> SubscriptionHandle {
        self.registry.subscribe(subject_id).await
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }

    pub fn watched_subjects(&self) -> Vec<SubjectId> {
        self.registry.subjects()
    }

    // === Teardown ===

    /// Cancel the pending activity write only; subscriptions keep running
    pub fn cleanup(&self) {
        self.debouncer.cancel_pending();
    }

    /// Cancel the pending activity write and every subscription
    pub fn cleanup_all(&self) {
        let pending = self.debouncer.cancel_pending();
        let subscriptions = self.registry.cleanup_all();
        info!(pending, subscriptions, "Presence cleaned up");
    }

    /// [`Self::cleanup_all`], then wait for subscription workers to exit
    pub async fn shutdown(&self) {
        self.debouncer.cancel_pending();
        self.registry.shutdown().await;
    }
}

impl std::fmt::Debug for PresenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceService")
            .field("debouncer", &self.debouncer)
            .field("registry", &self.registry)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
