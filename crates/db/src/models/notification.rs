//! Book notification entity models.

use serde::Serialize;
use slotwatch_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `book_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookNotification {
    pub id: DbId,
    pub book_alert_id: DbId,
    pub book_slot_id: DbId,
    pub active: bool,
    pub created_at: Timestamp,
    pub deactivated_at: Option<Timestamp>,
}

/// An active notification together with the current availability of the
/// slot it points at.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveNotification {
    pub id: DbId,
    pub book_alert_id: DbId,
    pub book_slot_id: DbId,
    pub slot_available: bool,
}
