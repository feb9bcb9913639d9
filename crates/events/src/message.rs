use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotwatch_core::types::{BookDate, DbId};

/// Announcement that an alert has a newly available slot.
///
/// Serialized in camelCase for subscribers on the pub/sub channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotNotificationMessage {
    pub alert_id: DbId,
    /// Who should be told (the alert's recipient reference).
    pub recipient: String,
    pub restaurant_name: String,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
    pub hour: String,
    pub created_at: DateTime<Utc>,
}
