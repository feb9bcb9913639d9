//! Book slot entity models.

use serde::Serialize;
use slotwatch_core::types::{BookDate, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `book_slots` table: the last known availability of one
/// bookable hour.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookSlot {
    pub id: DbId,
    pub restaurant_id: DbId,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
    pub hour: String,
    pub available: bool,
    /// Value of `available` immediately before the latest write.
    pub was_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Natural key of a slot; the upsert target of `SlotRepo::upsert`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub restaurant_id: DbId,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
    pub hour: String,
}
