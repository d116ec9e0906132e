//! Subscription registry
//!
//! Each subscription pairs a reconciliation poll with a change-stream worker.
//! Both feed fresh evaluations of one subject into the [`PresenceCache`] and
//! share a [`CancelToken`] that is checked before every cache write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use presence_cache::PresenceCache;
use presence_core::{ChangeBus, ChangeSubscription, RecordFilter, SubjectId, USERS_STATUS_COLLECTION};

use super::cancel::CancelToken;
use super::probe::StatusProbe;

/// Lifecycle of a subscription. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Cancelled,
}

/// Registered subscription and the tasks it owns
#[derive(Debug)]
struct Subscription {
    subject_id: SubjectId,
    token: Arc<CancelToken>,
    poll: JoinHandle<()>,
    stream: JoinHandle<()>,
}

impl Subscription {
    fn cancel(&self) {
        if self.token.cancel() {
            debug!(subject_id = %self.subject_id, "Subscription cancelled");
        }
    }
}

/// State shared by one subscription's poll and stream workers
struct Watch {
    subject_id: SubjectId,
    probe: StatusProbe,
    cache: Arc<PresenceCache>,
    token: Arc<CancelToken>,
    // Serialises poll and stream evaluations for this subscription
    gate: Mutex<()>,
}

impl Watch {
    /// Fetch, evaluate, and write the cache unless cancelled meanwhile
    async fn refresh(&self, trigger: &'static str) {
        let _gate = self.gate.lock().await;
        if self.token.is_cancelled() {
            return;
        }

        match self.probe.probe(&self.subject_id).await {
            Ok(online) => {
                // Check and write together so a cancel on another worker
                // cannot land in between
                let written = self
                    .token
                    .run_unless_cancelled(|| self.cache.set(self.subject_id.clone(), online));
                if written.is_none() {
                    debug!(subject_id = %self.subject_id, trigger, "Cancelled during fetch, discarding result");
                    return;
                }
                debug!(subject_id = %self.subject_id, trigger, online, "Presence evaluated");
            }
            Err(e) => {
                warn!(subject_id = %self.subject_id, trigger, error = %e, "Failed to check user status");
            }
        }
    }
}

/// Periodic reconciliation; the first tick comes one full period after start
async fn poll_worker(watch: Arc<Watch>, period: Duration) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = watch.token.cancelled() => break,
            _ = ticks.tick() => watch.refresh("poll").await,
        }
    }
}

/// Consume the change stream until cancelled or the stream ends
async fn stream_worker(watch: Arc<Watch>, mut changes: ChangeSubscription) {
    loop {
        let next = tokio::select! {
            biased;
            () = watch.token.cancelled() => break,
            next = changes.next() => next,
        };

        let Some(event) = next else {
            debug!(subject_id = %watch.subject_id, "Change stream ended");
            break;
        };

        // Coalesce whatever else is already queued into one fetch
        let mut relevant = event.event.triggers_evaluation();
        while let Some(queued) = changes.try_next() {
            relevant |= queued.event.triggers_evaluation();
        }

        if relevant {
            watch.refresh("change").await;
        }
    }

    changes.close();
}

/// Registry of live subscriptions
pub struct SubscriptionRegistry {
    bus: Arc<dyn ChangeBus>,
    probe: StatusProbe,
    cache: Arc<PresenceCache>,
    poll_interval: Duration,
    subscriptions: DashMap<u64, Subscription>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new(
        bus: Arc<dyn ChangeBus>,
        probe: StatusProbe,
        cache: Arc<PresenceCache>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            bus,
            probe,
            cache,
            poll_interval,
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start watching a subject.
    ///
    /// If the change bus refuses the subscription, the failure is logged and a
    /// no-op handle is returned; no poll is started in that case either.
    pub async fn subscribe(self: &Arc<Self>, subject_id: SubjectId) -> SubscriptionHandle {
        let filter = RecordFilter::subject(subject_id.clone());
        let changes = match self.bus.subscribe(USERS_STATUS_COLLECTION, &filter).await {
            Ok(changes) => changes,
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "Failed to subscribe to user status");
                return SubscriptionHandle::noop(subject_id);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = Arc::new(CancelToken::new());
        let watch = Arc::new(Watch {
            subject_id: subject_id.clone(),
            probe: self.probe.clone(),
            cache: self.cache.clone(),
            token: token.clone(),
            gate: Mutex::new(()),
        });

        let poll = tokio::spawn(poll_worker(watch.clone(), self.poll_interval));
        let stream = tokio::spawn(stream_worker(watch, changes));

        self.subscriptions.insert(
            id,
            Subscription {
                subject_id: subject_id.clone(),
                token: token.clone(),
                poll,
                stream,
            },
        );
        info!(subject_id = %subject_id, subscription = id, "Watching user status");

        SubscriptionHandle {
            id: Some(id),
            subject_id,
            token,
            registry: Arc::downgrade(self),
        }
    }

    /// Number of registered subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Subjects with at least one registered subscription
    pub fn subjects(&self) -> Vec<SubjectId> {
        let mut subjects: Vec<SubjectId> = self
            .subscriptions
            .iter()
            .map(|entry| entry.subject_id.clone())
            .collect();
        subjects.sort();
        subjects.dedup();
        subjects
    }

    /// Cancel every registered subscription and empty the registry.
    ///
    /// Returns how many were cancelled.
    pub fn cleanup_all(&self) -> usize {
        self.drain().len()
    }

    /// Like [`Self::cleanup_all`], then wait for every worker task to exit
    pub async fn shutdown(&self) {
        for subscription in self.drain() {
            // Workers exit on the token; a panicked worker has nothing left to clean
            let _ = subscription.poll.await;
            let _ = subscription.stream.await;
        }
    }

    fn drain(&self) -> Vec<Subscription> {
        let ids: Vec<u64> = self.subscriptions.iter().map(|entry| *entry.key()).collect();
        let drained: Vec<Subscription> = ids
            .into_iter()
            .filter_map(|id| self.subscriptions.remove(&id).map(|(_, sub)| sub))
            .collect();

        for subscription in &drained {
            subscription.cancel();
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "All subscriptions cancelled");
        }
        drained
    }

    fn cancel(&self, id: u64) {
        if let Some((_, subscription)) = self.subscriptions.remove(&id) {
            subscription.cancel();
        }
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.subscriptions.len())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Caller's handle to one subscription.
///
/// [`SubscriptionHandle::cancel`] stops both workers. Dropping the handle does
/// not cancel: the registry keeps the subscription until `cleanup_all`.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: Option<u64>,
    subject_id: SubjectId,
    token: Arc<CancelToken>,
    registry: Weak<SubscriptionRegistry>,
}

impl SubscriptionHandle {
    /// Handle for a subscription that never started
    fn noop(subject_id: SubjectId) -> Self {
        Self {
            id: None,
            subject_id,
            token: Arc::new(CancelToken::cancelled_token()),
            registry: Weak::new(),
        }
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Whether the bus refused this subscription
    pub fn is_noop(&self) -> bool {
        self.id.is_none()
    }

    pub fn state(&self) -> SubscriptionState {
        if self.token.is_cancelled() {
            SubscriptionState::Cancelled
        } else {
            SubscriptionState::Active
        }
    }

    /// Stop the poll and close the change stream. Idempotent across
    /// `cleanup_all`: cancelling an already-drained subscription does nothing.
    pub fn cancel(self) {
        self.token.cancel();
        if let (Some(id), Some(registry)) = (self.id, self.registry.upgrade()) {
            registry.cancel(id);
        }
    }
}
