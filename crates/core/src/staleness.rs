//! Recheck and completion windows for alerts.

use chrono::Duration;

use crate::types::{BookDate, Timestamp};

/// Minimum time between two availability checks of the same alert.
pub const RECHECK_INTERVAL_MINUTES: i64 = 10;

/// How long past its target date an alert stays active.
pub const STALE_AFTER_DAYS: i64 = 1;

/// Alerts last checked before this instant are due for a recheck.
pub fn recheck_cutoff(now: Timestamp) -> Timestamp {
    now - Duration::minutes(RECHECK_INTERVAL_MINUTES)
}

/// Whether an alert for `date` should be completed at `now`.
///
/// The date is taken at midnight UTC and compared with `now - 1 day`, so an
/// alert for today or a future day is never stale.
pub fn is_stale(date: BookDate, now: Timestamp) -> bool {
    let start_of_day = date.and_time(chrono::NaiveTime::MIN).and_utc();
    start_of_day < now - Duration::days(STALE_AFTER_DAYS)
}
