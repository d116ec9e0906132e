//! Redis Pub/Sub publisher.
//!
//! Publishes record change events so every node's subscriptions see them.

use async_trait::async_trait;
use redis::AsyncCommands;

use presence_core::{ChangeEvent, ChangePublisher, StoreResult};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::ChangeChannel;

/// Redis Pub/Sub publisher
#[derive(Clone, Debug)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel, returning the number of receivers
    pub async fn publish_to(&self, channel: &ChangeChannel, event: &ChangeEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event = %event.event,
            receivers = receivers,
            "Published change"
        );

        Ok(receivers)
    }
}

#[async_trait]
impl ChangePublisher for Publisher {
    async fn publish(&self, collection: &str, event: &ChangeEvent) -> StoreResult<()> {
        let channel = ChangeChannel::for_record(collection, &event.payload);
        self.publish_to(&channel, event).await?;
        Ok(())
    }
}
