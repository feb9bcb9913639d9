//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`: the notification engine
//! publishes into it and any number of services (the Redis relay, tests)
//! subscribe.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::message::SlotNotificationMessage;
use crate::publisher::{NotificationPublisher, PublishError};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`SlotNotificationMessage`]s.
pub struct EventBus {
    sender: broadcast::Sender<SlotNotificationMessage>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send a message to all current subscribers.
    ///
    /// Returns the number of subscribers reached; zero means the message
    /// was dropped.
    pub fn send(&self, message: SlotNotificationMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SlotNotificationMessage> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl NotificationPublisher for EventBus {
    async fn publish(&self, message: &SlotNotificationMessage) -> Result<(), PublishError> {
        if self.send(message.clone()) == 0 {
            tracing::warn!(
                alert_id = message.alert_id,
                "Notification published with no subscribers"
            );
        }
        Ok(())
    }
}
