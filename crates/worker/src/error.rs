use slotwatch_availability::AvailabilityError;
use slotwatch_core::types::DbId;
use slotwatch_events::PublishError;

/// Failures surfaced by the watcher engine.
///
/// None of these abort a tick: they are collected per row and returned to
/// the caller of the tick for reporting.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Reservation service error: {0}")]
    Availability(#[from] AvailabilityError),

    #[error("Failed to publish notification for alert {alert_id}: {source}")]
    Publish {
        alert_id: DbId,
        #[source]
        source: PublishError,
    },

    #[error("Invalid alert request: {0}")]
    InvalidAlert(String),

    #[error("Unknown restaurant: {0}")]
    UnknownRestaurant(String),
}

pub type WatchResult<T> = Result<T, WatchError>;
