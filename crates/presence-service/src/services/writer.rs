//! Presence writer
//!
//! Create-or-update of a subject's status record, single-flight per subject.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use presence_core::{
    RecordFilter, RecordStore, StatusFields, StoreResult, SubjectId, USERS_STATUS_COLLECTION,
};

/// Result of a single write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No record existed; one was created
    Created,
    /// The existing record was updated
    Updated,
    /// Another write for the same subject was in flight
    Dropped,
    /// The store rejected the write; logged and swallowed
    Failed,
}

impl WriteOutcome {
    #[must_use]
    pub fn is_persisted(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Writes status records, dropping (never queueing) a write that arrives while
/// another write for the same subject is in flight.
pub struct PresenceWriter {
    store: Arc<dyn RecordStore>,
    guards: DashMap<SubjectId, Arc<Mutex<()>>>,
}

impl PresenceWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            guards: DashMap::new(),
        }
    }

    /// Persist `online` and `last_activity_at = now` for a subject.
    ///
    /// Never fails: store errors are logged and reported as [`WriteOutcome::Failed`].
    #[instrument(skip(self))]
    pub async fn write(&self, subject_id: &SubjectId, online: bool, now: DateTime<Utc>) -> WriteOutcome {
        let lock = self.guards.entry(subject_id.clone()).or_default().clone();
        let Ok(guard) = lock.try_lock_owned() else {
            debug!(subject_id = %subject_id, "Write already in flight, dropping");
            return WriteOutcome::Dropped;
        };

        let outcome = match self.upsert(subject_id, StatusFields::new(online, now)).await {
            Ok(outcome) => {
                debug!(subject_id = %subject_id, online, ?outcome, "Status written");
                outcome
            }
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "Failed to update user status");
                WriteOutcome::Failed
            }
        };

        drop(guard);
        self.prune(subject_id);
        outcome
    }

    /// Number of subjects with a write in flight
    pub fn in_flight(&self) -> usize {
        self.guards
            .iter()
            .filter(|entry| entry.value().try_lock().is_err())
            .count()
    }

    async fn upsert(&self, subject_id: &SubjectId, fields: StatusFields) -> StoreResult<WriteOutcome> {
        let existing = self
            .store
            .query_one(
                USERS_STATUS_COLLECTION,
                &RecordFilter::subject(subject_id.clone()),
            )
            .await?;

        match existing {
            Some(record) => {
                self.store
                    .update(USERS_STATUS_COLLECTION, record.id, fields)
                    .await?;
                Ok(WriteOutcome::Updated)
            }
            None => {
                self.store
                    .create(USERS_STATUS_COLLECTION, subject_id, fields)
                    .await?;
                Ok(WriteOutcome::Created)
            }
        }
    }

    // Drop the guard entry once nobody else holds a reference to it
    fn prune(&self, subject_id: &SubjectId) {
        self.guards
            .remove_if(subject_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl std::fmt::Debug for PresenceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceWriter")
            .field("guards", &self.guards.len())
            .finish_non_exhaustive()
    }
}
