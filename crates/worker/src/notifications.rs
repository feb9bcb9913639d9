//! Notification derivation and retraction.
//!
//! Runs once per tick after every lookup of that tick has been ingested.
//! A notification moves `absent -> active -> inactive` and is never
//! reactivated; a slot that reopens gets a fresh active row.

use std::sync::Arc;

use chrono::Utc;
use slotwatch_db::models::alert::BookAlert;
use slotwatch_db::models::notification::BookNotification;
use slotwatch_db::models::slot::BookSlot;
use slotwatch_events::{NotificationPublisher, SlotNotificationMessage};

use crate::error::WatchError;
use crate::repository::SlotRepository;

/// Result of one notification pass. Errors are per row; a failed row never
/// stops the rest of the pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Notifications created or deactivated.
    pub affected: usize,
    pub errors: Vec<WatchError>,
}

#[derive(Clone)]
pub struct NotificationEngine {
    repo: Arc<dyn SlotRepository>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl NotificationEngine {
    pub fn new(repo: Arc<dyn SlotRepository>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self { repo, publisher }
    }

    /// Create and publish one notification per (active alert, available
    /// matching slot) pair that has no active notification yet.
    pub async fn create_notifications(&self) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        let alerts = match self.repo.active_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list active alerts");
                outcome.errors.push(e.into());
                return outcome;
            }
        };

        for alert in &alerts {
            let slots = match self.repo.matching_available_slots(alert).await {
                Ok(slots) => slots,
                Err(e) => {
                    tracing::error!(alert_id = alert.id, error = %e, "Failed to load matching slots");
                    outcome.errors.push(e.into());
                    continue;
                }
            };

            for slot in &slots {
                match self.notify(alert, slot).await {
                    Ok(Some(_)) => outcome.affected += 1,
                    Ok(None) => {}
                    Err(e) => outcome.errors.push(e),
                }
            }
        }

        outcome
    }

    /// Deactivate every active notification whose slot is no longer
    /// available.
    pub async fn cleanup_active_notifications(&self) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        let active = match self.repo.active_notifications().await {
            Ok(active) => active,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list active notifications");
                outcome.errors.push(e.into());
                return outcome;
            }
        };

        for notification in active.iter().filter(|n| !n.slot_available) {
            match self.repo.deactivate_notification(notification.id).await {
                Ok(true) => {
                    tracing::info!(
                        notification_id = notification.id,
                        alert_id = notification.book_alert_id,
                        slot_id = notification.book_slot_id,
                        "Notification deactivated",
                    );
                    outcome.affected += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        notification_id = notification.id,
                        error = %e,
                        "Failed to deactivate notification",
                    );
                    outcome.errors.push(e.into());
                }
            }
        }

        outcome
    }

    /// Create the notification for one pair and publish it.
    ///
    /// `Ok(None)` when the pair already has an active notification. When the
    /// existence check itself fails the pair is treated as notified, so a
    /// flaky read never produces a duplicate message.
    async fn notify(
        &self,
        alert: &BookAlert,
        slot: &BookSlot,
    ) -> Result<Option<BookNotification>, WatchError> {
        match self.repo.active_notification_exists(alert.id, slot.id).await {
            Ok(true) => return Ok(None),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    alert_id = alert.id,
                    slot_id = slot.id,
                    error = %e,
                    "Failed to check for an active notification",
                );
                return Err(e.into());
            }
        }

        let notification = match self.repo.create_notification(alert.id, slot.id).await {
            Ok(Some(notification)) => notification,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::error!(
                    alert_id = alert.id,
                    slot_id = slot.id,
                    error = %e,
                    "Failed to create notification",
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            notification_id = notification.id,
            alert_id = alert.id,
            slot_id = slot.id,
            hour = %slot.hour,
            "Notification created",
        );

        let message = SlotNotificationMessage {
            alert_id: alert.id,
            recipient: alert.recipient.clone(),
            restaurant_name: alert.restaurant_name.clone(),
            date: slot.date,
            meal_period: slot.meal_period.clone(),
            party_mix: slot.party_mix,
            hour: slot.hour.clone(),
            created_at: Utc::now(),
        };

        if let Err(source) = self.publisher.publish(&message).await {
            tracing::error!(alert_id = alert.id, error = %source, "Failed to publish notification");
            return Err(WatchError::Publish {
                alert_id: alert.id,
                source,
            });
        }

        Ok(Some(notification))
    }
}
