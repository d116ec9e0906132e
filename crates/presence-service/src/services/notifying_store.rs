//! Record store decorator that announces its writes on a change bus.
//!
//! Self-hosted deployments have no store-side realtime feed; wrapping the
//! store makes every create/update visible to subscribers on all nodes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use presence_core::{
    ChangeEvent, ChangePublisher, RecordQuery, RecordStore, StatusFields, StatusRecord,
    StoreResult, SubjectId,
};

/// Publishes `create`/`update` events after successful writes
pub struct NotifyingStore {
    inner: Arc<dyn RecordStore>,
    publisher: Arc<dyn ChangePublisher>,
}

impl NotifyingStore {
    pub fn new(inner: Arc<dyn RecordStore>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { inner, publisher }
    }

    // A lost notification is repaired by the next poll
    async fn announce(&self, collection: &str, event: ChangeEvent) {
        if let Err(e) = self.publisher.publish(collection, &event).await {
            warn!(
                subject_id = %event.payload.subject_id,
                event = %event.event,
                error = %e,
                "Failed to publish change"
            );
        }
    }
}

#[async_trait]
impl RecordStore for NotifyingStore {
    async fn query(&self, collection: &str, query: &RecordQuery) -> StoreResult<Vec<StatusRecord>> {
        self.inner.query(collection, query).await
    }

    async fn create(
        &self,
        collection: &str,
        subject_id: &SubjectId,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        let record = self.inner.create(collection, subject_id, fields).await?;
        self.announce(collection, ChangeEvent::created(record.clone()))
            .await;
        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        let record = self.inner.update(collection, id, fields).await?;
        self.announce(collection, ChangeEvent::updated(record.clone()))
            .await;
        Ok(record)
    }
}

impl std::fmt::Debug for NotifyingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyingStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use presence_cache::LocalChangeBus;
    use presence_core::{ChangeBus, ChangeKind, DomainError, RecordFilter, USERS_STATUS_COLLECTION};
    use presence_db::MemoryStatusStore;

    struct BrokenPublisher;

    #[async_trait]
    impl ChangePublisher for BrokenPublisher {
        async fn publish(&self, _collection: &str, _event: &ChangeEvent) -> StoreResult<()> {
            Err(DomainError::CacheError("connection refused".to_string()))
        }
    }

    fn subject() -> SubjectId {
        SubjectId::new("u1").unwrap()
    }

    #[tokio::test]
    async fn test_writes_are_announced() {
        let bus = Arc::new(LocalChangeBus::new(8));
        let store = NotifyingStore::new(Arc::new(MemoryStatusStore::new()), bus.clone());
        let mut changes = bus
            .subscribe(USERS_STATUS_COLLECTION, &RecordFilter::subject(subject()))
            .await
            .unwrap();

        let created = store
            .create(USERS_STATUS_COLLECTION, &subject(), StatusFields::new(true, Utc::now()))
            .await
            .unwrap();
        store
            .update(USERS_STATUS_COLLECTION, created.id, StatusFields::new(false, Utc::now()))
            .await
            .unwrap();

        assert_eq!(changes.next().await.unwrap().event, ChangeKind::Create);
        let update = changes.next().await.unwrap();
        assert_eq!(update.event, ChangeKind::Update);
        assert!(!update.payload.online);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_write() {
        let inner = Arc::new(MemoryStatusStore::new());
        let store = NotifyingStore::new(inner.clone(), Arc::new(BrokenPublisher));

        store
            .create(USERS_STATUS_COLLECTION, &subject(), StatusFields::new(true, Utc::now()))
            .await
            .unwrap();

        assert_eq!(inner.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_announced() {
        let bus = Arc::new(LocalChangeBus::new(8));
        let inner = Arc::new(MemoryStatusStore::new());
        inner.set_unavailable(true);
        let store = NotifyingStore::new(inner, bus.clone());
        let mut changes = bus
            .subscribe(USERS_STATUS_COLLECTION, &RecordFilter::subject(subject()))
            .await
            .unwrap();

        assert!(store
            .create(USERS_STATUS_COLLECTION, &subject(), StatusFields::new(true, Utc::now()))
            .await
            .is_err());

        tokio::task::yield_now().await;
        assert!(changes.try_next().is_none());
    }
}
