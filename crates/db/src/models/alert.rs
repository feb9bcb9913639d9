//! Book alert entity models and DTOs.

use serde::{Deserialize, Serialize};
use slotwatch_core::types::{BookDate, DbId, Timestamp};
use sqlx::FromRow;

/// A row from `book_alerts` joined with its restaurant.
///
/// The restaurant columns are denormalised into the struct because every
/// consumer needs them: the dispatcher queries by `restaurant_external_id`
/// and outbound notifications carry `restaurant_name`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookAlert {
    pub id: DbId,
    pub restaurant_id: DbId,
    pub restaurant_external_id: String,
    pub restaurant_name: String,
    /// Who receives notifications for this alert (e.g. a chat user id).
    pub recipient: String,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
    pub completed: bool,
    pub checked_at: Timestamp,
    pub check_count: i32,
    pub error_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an alert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookAlert {
    pub restaurant_id: DbId,
    pub recipient: String,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
}
