//! Redis Pub/Sub publisher.
//!
//! Publishes change events to their table channel.

use async_trait::async_trait;
use redis::AsyncCommands;

use roomchat_core::events::ChangeEvent;
use roomchat_core::traits::{ChangePublisher, RepoResult};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish a change event on its table channel
    pub async fn publish_change(&self, event: &ChangeEvent) -> RedisResult<u32> {
        let payload = serde_json::to_string(event)?;
        self.publish_raw(&PubSubChannel::table(event.table), &payload)
            .await
    }

    /// Publish a raw message to a channel
    pub async fn publish_raw(&self, channel: &PubSubChannel, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();

        let receivers: u32 = conn.publish(&channel_name, message).await?;

        tracing::debug!(
            channel = %channel_name,
            receivers = receivers,
            "Published message"
        );

        Ok(receivers)
    }
}

#[async_trait]
impl ChangePublisher for Publisher {
    async fn publish(&self, event: &ChangeEvent) -> RepoResult<()> {
        self.publish_change(event).await?;
        Ok(())
    }
}
