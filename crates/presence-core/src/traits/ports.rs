//! Store and change-bus traits (ports) - define the interface for remote state
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL, Redis, or in-process adapters).

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::query::{RecordFilter, RecordQuery};
use crate::entities::{StatusFields, StatusRecord};
use crate::error::DomainError;
use crate::events::ChangeEvent;
use crate::value_objects::SubjectId;

/// Result type for store and bus operations
pub type StoreResult<T> = Result<T, DomainError>;

/// Collection holding one status record per subject
pub const USERS_STATUS_COLLECTION: &str = "users_status";

// ============================================================================
// Record Store
// ============================================================================

/// Eventually-consistent record store. No transactions are required.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch up to `query.limit` records matching the filter
    async fn query(&self, collection: &str, query: &RecordQuery) -> StoreResult<Vec<StatusRecord>>;

    /// Fetch the first record matching the filter
    async fn query_one(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> StoreResult<Option<StatusRecord>> {
        let records = self
            .query(collection, &RecordQuery::new(filter.clone()))
            .await?;
        Ok(records.into_iter().next())
    }

    /// Create a record for a subject
    async fn create(
        &self,
        collection: &str,
        subject_id: &SubjectId,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord>;

    /// Update an existing record's fields
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord>;
}

// ============================================================================
// Change Bus
// ============================================================================

/// Publish/subscribe source of record change notifications
#[async_trait]
pub trait ChangeBus: Send + Sync {
    /// Open a change stream for records in `collection` matching `filter`
    async fn subscribe(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> StoreResult<ChangeSubscription>;
}

/// Sink for change notifications (the producing side of a change bus)
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Publish a change for a record in `collection`
    async fn publish(&self, collection: &str, event: &ChangeEvent) -> StoreResult<()>;
}

/// Consumer side of a change stream.
///
/// Events are buffered in a bounded queue fed by the bus adapter. Closing the
/// subscription (or dropping it) signals the adapter's [`ChangeFeed`] so the
/// forwarding task can release its upstream resources.
#[derive(Debug)]
pub struct ChangeSubscription {
    events: mpsc::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Create a connected feed/subscription pair
    #[must_use]
    pub fn channel(capacity: usize) -> (ChangeFeed, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChangeFeed { tx }, Self { events: rx })
    }

    /// Await the next event; `None` once the stream is closed and drained
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Take an already-queued event without waiting
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Terminate the stream. Already-queued events can still be drained.
    pub fn close(&mut self) {
        self.events.close();
    }
}

/// Producer side of a change stream, held by the bus adapter
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Forward an event; returns `false` once the subscription is closed
    pub async fn send(&self, event: ChangeEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Resolves when the subscription is closed or dropped
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
