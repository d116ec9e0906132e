//! In-process change bus.
//!
//! Fans published changes out to filtered subscriptions over a tokio broadcast
//! channel. Used when no Redis is configured and by tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

use presence_core::{
    ChangeBus, ChangeEvent, ChangeFeed, ChangePublisher, ChangeSubscription, DomainError,
    RecordFilter, StoreResult,
};

/// Published change tagged with its collection
#[derive(Debug, Clone)]
struct Envelope {
    collection: String,
    event: ChangeEvent,
}

/// Change bus local to this process
#[derive(Debug)]
pub struct LocalChangeBus {
    tx: broadcast::Sender<Envelope>,
    buffer: usize,
    unavailable: AtomicBool,
}

impl Default for LocalChangeBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl LocalChangeBus {
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        let buffer = buffer.max(1);
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            buffer,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make subsequent `subscribe` calls fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live subscription forwarders
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    async fn forward(
        collection: String,
        filter: RecordFilter,
        mut rx: broadcast::Receiver<Envelope>,
        feed: ChangeFeed,
    ) {
        loop {
            tokio::select! {
                () = feed.closed() => break,

                received = rx.recv() => match received {
                    Ok(envelope) => {
                        if envelope.collection != collection || !filter.matches(&envelope.event.payload) {
                            continue;
                        }
                        if !feed.send(envelope.event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Change subscription lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }
}

#[async_trait]
impl ChangeBus for LocalChangeBus {
    async fn subscribe(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> StoreResult<ChangeSubscription> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::SubscriptionFailed(
                "change bus unavailable".to_string(),
            ));
        }

        let rx = self.tx.subscribe();
        let (feed, subscription) = ChangeSubscription::channel(self.buffer);
        tokio::spawn(Self::forward(
            collection.to_string(),
            filter.clone(),
            rx,
            feed,
        ));

        Ok(subscription)
    }
}

#[async_trait]
impl ChangePublisher for LocalChangeBus {
    async fn publish(&self, collection: &str, event: &ChangeEvent) -> StoreResult<()> {
        // No receivers is not an error
        let _ = self.tx.send(Envelope {
            collection: collection.to_string(),
            event: event.clone(),
        });
        Ok(())
    }
}
