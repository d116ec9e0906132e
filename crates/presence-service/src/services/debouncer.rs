//! Activity debouncer
//!
//! Collapses bursts of `mark_active` calls into one write, fired `window`
//! after the last call (trailing edge). At most one timer is pending.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use presence_core::{Clock, SubjectId};

use super::cancel::CancelToken;
use super::writer::PresenceWriter;

/// Timer waiting to fire
#[derive(Debug)]
struct PendingWrite {
    token: Arc<CancelToken>,
    task: JoinHandle<()>,
}

type PendingSlot = Arc<Mutex<Option<PendingWrite>>>;
type ActorSlot = Arc<RwLock<Option<SubjectId>>>;

/// Trailing-edge debouncer in front of [`PresenceWriter`]
pub struct ActivityDebouncer {
    writer: Arc<PresenceWriter>,
    clock: Arc<dyn Clock>,
    window: Duration,
    actor: ActorSlot,
    pending: PendingSlot,
}

impl ActivityDebouncer {
    pub fn new(writer: Arc<PresenceWriter>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            writer,
            clock,
            window,
            actor: Arc::new(RwLock::new(None)),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Set or clear the subject whose activity is being tracked
    pub fn set_actor(&self, actor: Option<SubjectId>) {
        *self.actor.write() = actor;
    }

    pub fn actor(&self) -> Option<SubjectId> {
        self.actor.read().clone()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the trailing timer. No-op without a current actor.
    pub fn mark_active(&self) {
        if self.actor.read().is_none() {
            return;
        }

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.token.cancel();
        }

        let token = Arc::new(CancelToken::new());
        let task = tokio::spawn(Self::fire(
            self.writer.clone(),
            self.clock.clone(),
            self.actor.clone(),
            self.pending.clone(),
            self.window,
            token.clone(),
        ));
        *pending = Some(PendingWrite { token, task });
    }

    /// Cancel the pending timer, if any. Returns whether one was pending.
    pub fn cancel_pending(&self) -> bool {
        match self.pending.lock().take() {
            Some(previous) => {
                previous.token.cancel();
                debug!("Pending activity write cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether a timer is waiting to fire
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|pending| !pending.task.is_finished())
    }

    async fn fire(
        writer: Arc<PresenceWriter>,
        clock: Arc<dyn Clock>,
        actor: ActorSlot,
        pending: PendingSlot,
        window: Duration,
        token: Arc<CancelToken>,
    ) {
        tokio::select! {
            biased;
            () = token.cancelled() => return,
            () = tokio::time::sleep(window) => {}
        }

        // Leave the slot before writing so a later mark_active cannot cancel
        // a write that has already started.
        {
            let mut slot = pending.lock();
            if token.is_cancelled() {
                return;
            }
            if slot
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(&current.token, &token))
            {
                *slot = None;
            }
        }

        let Some(subject_id) = actor.read().clone() else {
            return;
        };
        writer.write(&subject_id, true, clock.now()).await;
    }
}

impl std::fmt::Debug for ActivityDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityDebouncer")
            .field("window", &self.window)
            .field("actor", &self.actor())
            .field("pending", &self.has_pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use presence_core::ManualClock;
    use presence_db::MemoryStatusStore;

    const WINDOW: Duration = Duration::from_millis(1000);

    fn setup() -> (Arc<MemoryStatusStore>, ActivityDebouncer) {
        let store = Arc::new(MemoryStatusStore::new());
        let writer = Arc::new(PresenceWriter::new(store.clone()));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let debouncer = ActivityDebouncer::new(writer, clock, WINDOW);
        debouncer.set_actor(Some(SubjectId::new("u1").unwrap()));
        (store, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_write() {
        let (store, debouncer) = setup();

        for _ in 0..5 {
            debouncer.mark_active();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(WINDOW).await;
        assert_eq!(store.write_count(), 1);
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_write_each_time() {
        let (store, debouncer) = setup();

        debouncer.mark_active();
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        debouncer.mark_active();
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;

        assert_eq!(store.create_count(), 1);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_actor_is_noop() {
        let (store, debouncer) = setup();
        debouncer.set_actor(None);

        debouncer.mark_active();
        assert!(!debouncer.has_pending());

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_read_when_timer_fires() {
        let (store, debouncer) = setup();

        debouncer.mark_active();
        debouncer.set_actor(Some(SubjectId::new("u2").unwrap()));
        tokio::time::sleep(WINDOW * 2).await;

        assert!(store.get(&SubjectId::new("u1").unwrap()).is_none());
        assert!(store.get(&SubjectId::new("u2").unwrap()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_stops_write() {
        let (store, debouncer) = setup();

        debouncer.mark_active();
        assert!(debouncer.has_pending());
        assert!(debouncer.cancel_pending());
        assert!(!debouncer.cancel_pending());

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(store.write_count(), 0);
    }
}
