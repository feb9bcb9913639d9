//! Restaurant entity models and DTOs.

use serde::{Deserialize, Serialize};
use slotwatch_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `restaurants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Restaurant {
    pub id: DbId,
    /// Identifier of the restaurant on the reservation service.
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a restaurant discovered by the catalogue sync.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRestaurant {
    pub external_id: String,
    pub name: String,
    pub image_url: String,
}
