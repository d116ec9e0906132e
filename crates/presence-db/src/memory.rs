//! In-process record store
//!
//! Holds `users_status` records in memory. The in-process adapter for tests
//! that need to observe store traffic or simulate outages and latency.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;
use uuid::Uuid;

use presence_core::{
    DomainError, RecordQuery, RecordStore, StatusFields, StatusRecord, StoreResult, SubjectId,
};

use crate::repositories::check_collection;

/// In-memory implementation of RecordStore
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: DashMap<Uuid, StatusRecord>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    stats: StoreStats,
}

/// Operation counters
#[derive(Debug, Default)]
struct StoreStats {
    queries: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a database error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent operation
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Insert a record directly, bypassing counters
    pub fn insert(&self, record: StatusRecord) {
        self.records.insert(record.id, record);
    }

    /// Current record for a subject, if any
    pub fn get(&self, subject_id: &SubjectId) -> Option<StatusRecord> {
        self.records
            .iter()
            .find(|entry| &entry.subject_id == subject_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn query_count(&self) -> usize {
        self.stats.queries.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.stats.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.stats.updates.load(Ordering::SeqCst)
    }

    /// Creates plus updates
    pub fn write_count(&self) -> usize {
        self.create_count() + self.update_count()
    }

    async fn enter(&self, collection: &str, counter: &AtomicUsize) -> StoreResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError(
                "record store unavailable".to_string(),
            ));
        }

        check_collection(collection)
    }
}

#[async_trait]
impl RecordStore for MemoryStatusStore {
    #[instrument(skip(self))]
    async fn query(&self, collection: &str, query: &RecordQuery) -> StoreResult<Vec<StatusRecord>> {
        self.enter(collection, &self.stats.queries).await?;

        Ok(self
            .records
            .iter()
            .filter(|entry| query.filter.matches(entry.value()))
            .take(query.limit)
            .map(|entry| entry.value().clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn create(
        &self,
        collection: &str,
        subject_id: &SubjectId,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        self.enter(collection, &self.stats.creates).await?;

        let record = StatusRecord::new(subject_id.clone(), fields);
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        self.enter(collection, &self.stats.updates).await?;

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(DomainError::RecordNotFound(id))?;
        record.apply(fields);
        Ok(record.clone())
    }
}
