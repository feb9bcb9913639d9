//! Redis pub/sub delivery.
//!
//! [`RedisPublisher`] serializes each message to JSON and `PUBLISH`es it on
//! a fixed channel over a multiplexed connection.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::message::SlotNotificationMessage;
use crate::publisher::{NotificationPublisher, PublishError};

/// Default channel for outbound notifications.
pub const DEFAULT_NOTIFICATION_CHANNEL: &str = "book-notifications";

/// Publishes notification messages to a Redis channel.
pub struct RedisPublisher {
    connection: MultiplexedConnection,
    channel: String,
}

impl RedisPublisher {
    /// Open a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str, channel: impl Into<String>) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            connection,
            channel: channel.into(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl NotificationPublisher for RedisPublisher {
    async fn publish(&self, message: &SlotNotificationMessage) -> Result<(), PublishError> {
        let payload = serde_json::to_string(message)?;
        // The multiplexed connection is a cheap handle onto one socket.
        let mut connection = self.connection.clone();
        let receivers: i64 = connection.publish(&self.channel, payload).await?;
        tracing::debug!(
            alert_id = message.alert_id,
            channel = %self.channel,
            receivers,
            "Notification published to Redis"
        );
        Ok(())
    }
}
