use serde::Serialize;
use sqlx::FromRow;

/// Aggregate counters logged by the daily maintenance run.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct WatchStatistics {
    /// Alerts that are still being watched.
    pub active_alerts: i64,
    /// Slots whose date is in the future.
    pub upcoming_slots: i64,
    /// Notifications ever created.
    pub sent_notifications: i64,
}
