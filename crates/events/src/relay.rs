//! Forwarding of bus messages to an external transport.
//!
//! [`NotificationRelay`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and hands every received message to a downstream publisher (Redis in
//! production). Without a downstream it only logs. It runs as a
//! long-lived background task and shuts down when the bus is dropped.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::message::SlotNotificationMessage;
use crate::publisher::NotificationPublisher;

pub struct NotificationRelay {
    downstream: Option<Arc<dyn NotificationPublisher>>,
}

impl NotificationRelay {
    pub fn new(downstream: Option<Arc<dyn NotificationPublisher>>) -> Self {
        Self { downstream }
    }

    /// Run the relay loop until the channel is closed.
    ///
    /// Returns the number of messages delivered downstream.
    pub async fn run(self, mut receiver: broadcast::Receiver<SlotNotificationMessage>) -> u64 {
        let mut delivered = 0;
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    if self.forward(&message).await {
                        delivered += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification relay lagged, messages were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Notification bus closed, relay shutting down");
                    break;
                }
            }
        }
        delivered
    }

    async fn forward(&self, message: &SlotNotificationMessage) -> bool {
        let Some(downstream) = &self.downstream else {
            tracing::info!(
                alert_id = message.alert_id,
                recipient = %message.recipient,
                restaurant = %message.restaurant_name,
                date = %message.date,
                meal_period = %message.meal_period,
                party_mix = message.party_mix,
                hour = %message.hour,
                "Slot available"
            );
            return true;
        };

        match downstream.publish(message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    alert_id = message.alert_id,
                    error = %e,
                    "Failed to deliver notification"
                );
                false
            }
        }
    }
}
