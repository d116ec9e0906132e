//! Redis Pub/Sub subscriber.
//!
//! Every subscription opens its own pub/sub connection and a forwarding task
//! that pushes parsed change events into the subscription's queue. The task
//! ends, and the connection with it, once the subscription is closed.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use redis::{Client, Msg};

use presence_core::{
    ChangeBus, ChangeEvent, ChangeFeed, ChangeSubscription, DomainError, RecordFilter, StoreResult,
};

use crate::pubsub::ChangeChannel;

/// Default per-subscription queue capacity
const DEFAULT_BUFFER: usize = 64;

/// Change bus backed by Redis Pub/Sub
#[derive(Debug, Clone)]
pub struct RedisChangeBus {
    client: Client,
    buffer: usize,
}

impl RedisChangeBus {
    /// Create a bus for the given Redis URL
    pub fn new(redis_url: &str, buffer: usize) -> StoreResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| DomainError::SubscriptionFailed(e.to_string()))?;
        Ok(Self {
            client,
            buffer: buffer.max(1),
        })
    }

    /// Create a bus with the default queue capacity
    pub fn with_default_buffer(redis_url: &str) -> StoreResult<Self> {
        Self::new(redis_url, DEFAULT_BUFFER)
    }

    /// Forward messages until the subscription closes or the stream ends
    async fn forward(
        channel: String,
        filter: RecordFilter,
        stream: impl Stream<Item = Msg> + Send,
        feed: ChangeFeed,
    ) {
        let mut stream = std::pin::pin!(stream);
        loop {
            tokio::select! {
                () = feed.closed() => {
                    tracing::debug!(channel = %channel, "Subscription closed, releasing connection");
                    break;
                }

                msg = stream.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!(channel = %channel, "Pub/Sub stream ended");
                        break;
                    };

                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(channel = %channel, error = %e, "Unreadable Pub/Sub payload");
                            continue;
                        }
                    };

                    match ChangeEvent::from_json(&payload) {
                        Ok(event) if filter.matches(&event.payload) => {
                            if !feed.send(event).await {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(channel = %channel, error = %e, "Malformed change event");
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ChangeBus for RedisChangeBus {
    async fn subscribe(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> StoreResult<ChangeSubscription> {
        let channel = ChangeChannel::for_filter(collection, filter).name();

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| DomainError::SubscriptionFailed(e.to_string()))?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| DomainError::SubscriptionFailed(e.to_string()))?;

        tracing::debug!(channel = %channel, "Subscribed to changes");

        let (feed, subscription) = ChangeSubscription::channel(self.buffer);
        tokio::spawn(Self::forward(
            channel,
            filter.clone(),
            pubsub.into_on_message(),
            feed,
        ));

        Ok(subscription)
    }
}
