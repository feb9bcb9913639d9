//! The storage seam of the engine.
//!
//! Every component receives an `Arc<dyn SlotRepository>` at construction.
//! Each method is a single statement against the store; the engine never
//! does a read-modify-write across two calls.

use async_trait::async_trait;
use slotwatch_core::staleness::recheck_cutoff;
use slotwatch_core::types::{DbId, Timestamp};
use slotwatch_db::models::alert::BookAlert;
use slotwatch_db::models::notification::{ActiveNotification, BookNotification};
use slotwatch_db::models::slot::{BookSlot, SlotKey};
use slotwatch_db::repositories::{AlertRepo, NotificationRepo, SlotRepo};
use slotwatch_db::DbPool;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Non-completed alerts not checked within the recheck interval before
    /// `now`, stalest first, at most `limit`.
    async fn due_alerts(&self, now: Timestamp, limit: i64) -> Result<Vec<BookAlert>, sqlx::Error>;

    /// Every non-completed alert.
    async fn active_alerts(&self) -> Result<Vec<BookAlert>, sqlx::Error>;

    /// Atomically record a new observation for `key`, shifting the previous
    /// `available` into `was_available`.
    async fn upsert_slot(&self, key: &SlotKey, available: bool) -> Result<BookSlot, sqlx::Error>;

    async fn mark_checked(&self, alert_id: DbId) -> Result<(), sqlx::Error>;

    async fn mark_errored(&self, alert_id: DbId) -> Result<(), sqlx::Error>;

    /// Available slots matching the alert's restaurant, date, meal period
    /// and party size.
    async fn matching_available_slots(&self, alert: &BookAlert)
        -> Result<Vec<BookSlot>, sqlx::Error>;

    async fn active_notification_exists(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<bool, sqlx::Error>;

    /// Create an active notification; `None` if one is already active for
    /// the pair.
    async fn create_notification(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<Option<BookNotification>, sqlx::Error>;

    async fn active_notifications(&self) -> Result<Vec<ActiveNotification>, sqlx::Error>;

    async fn deactivate_notification(&self, id: DbId) -> Result<bool, sqlx::Error>;

    async fn complete_alert(&self, id: DbId) -> Result<bool, sqlx::Error>;
}

/// [`SlotRepository`] over the PostgreSQL repositories.
#[derive(Clone)]
pub struct PgSlotRepository {
    pool: DbPool,
}

impl PgSlotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for PgSlotRepository {
    async fn due_alerts(&self, now: Timestamp, limit: i64) -> Result<Vec<BookAlert>, sqlx::Error> {
        AlertRepo::list_due(&self.pool, recheck_cutoff(now), limit).await
    }

    async fn active_alerts(&self) -> Result<Vec<BookAlert>, sqlx::Error> {
        AlertRepo::list_active(&self.pool).await
    }

    async fn upsert_slot(&self, key: &SlotKey, available: bool) -> Result<BookSlot, sqlx::Error> {
        SlotRepo::upsert(&self.pool, key, available).await
    }

    async fn mark_checked(&self, alert_id: DbId) -> Result<(), sqlx::Error> {
        AlertRepo::mark_checked(&self.pool, alert_id).await
    }

    async fn mark_errored(&self, alert_id: DbId) -> Result<(), sqlx::Error> {
        AlertRepo::mark_errored(&self.pool, alert_id).await
    }

    async fn matching_available_slots(
        &self,
        alert: &BookAlert,
    ) -> Result<Vec<BookSlot>, sqlx::Error> {
        SlotRepo::list_available_for_alert(&self.pool, alert).await
    }

    async fn active_notification_exists(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        NotificationRepo::active_exists(&self.pool, alert_id, slot_id).await
    }

    async fn create_notification(
        &self,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<Option<BookNotification>, sqlx::Error> {
        NotificationRepo::create_active(&self.pool, alert_id, slot_id).await
    }

    async fn active_notifications(&self) -> Result<Vec<ActiveNotification>, sqlx::Error> {
        NotificationRepo::list_active(&self.pool).await
    }

    async fn deactivate_notification(&self, id: DbId) -> Result<bool, sqlx::Error> {
        NotificationRepo::deactivate(&self.pool, id).await
    }

    async fn complete_alert(&self, id: DbId) -> Result<bool, sqlx::Error> {
        AlertRepo::complete(&self.pool, id).await
    }
}
