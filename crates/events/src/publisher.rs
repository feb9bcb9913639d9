use async_trait::async_trait;

use crate::message::SlotNotificationMessage;

/// Errors raised while handing a message to a transport.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Redis publish failed: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Fire-and-forget publication of notification messages.
///
/// A failure is reported to the caller; it is never retried by deriving
/// the notification again.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, message: &SlotNotificationMessage) -> Result<(), PublishError>;
}
