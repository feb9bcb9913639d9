//! Folds availability responses into slot rows.

use std::sync::Arc;

use chrono::NaiveDate;
use slotwatch_availability::RestaurantAvailability;
use slotwatch_core::status::is_available;
use slotwatch_core::types::{BookDate, DATE_FORMAT};
use slotwatch_db::models::alert::BookAlert;
use slotwatch_db::models::slot::SlotKey;

use crate::error::WatchError;
use crate::repository::SlotRepository;

/// Outcome of ingesting one response.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub upserted: usize,
    pub failed: Vec<WatchError>,
}

#[derive(Clone)]
pub struct AvailabilityIngester {
    repo: Arc<dyn SlotRepository>,
}

impl AvailabilityIngester {
    pub fn new(repo: Arc<dyn SlotRepository>) -> Self {
        Self { repo }
    }

    /// Upsert one slot per (meal period, hour) entry of `response`, keyed by
    /// the alert's restaurant and party size.
    ///
    /// A failed upsert is logged and collected; the remaining entries are
    /// still written. Nothing is retried here, the next check re-observes
    /// the slot anyway.
    pub async fn ingest(
        &self,
        response: &[RestaurantAvailability],
        alert: &BookAlert,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for day in response {
            let date = entry_date(day, alert);
            for period in &day.meal_periods {
                for slot in &period.slot_list {
                    let key = SlotKey {
                        restaurant_id: alert.restaurant_id,
                        date,
                        meal_period: period.meal_period.clone(),
                        party_mix: alert.party_mix,
                        hour: slot.time.clone(),
                    };
                    let available = is_available(&slot.available);

                    match self.repo.upsert_slot(&key, available).await {
                        Ok(_) => summary.upserted += 1,
                        Err(e) => {
                            tracing::error!(
                                alert_id = alert.id,
                                restaurant_id = key.restaurant_id,
                                date = %key.date,
                                meal_period = %key.meal_period,
                                hour = %key.hour,
                                error = %e,
                                "Failed to upsert slot",
                            );
                            summary.failed.push(e.into());
                        }
                    }
                }
            }
        }

        summary
    }
}

/// Date an entry describes, falling back to the alert's date when the
/// service leaves it empty or malformed.
fn entry_date(day: &RestaurantAvailability, alert: &BookAlert) -> BookDate {
    if day.date.is_empty() {
        return alert.date;
    }
    match NaiveDate::parse_from_str(&day.date, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            tracing::warn!(
                alert_id = alert.id,
                reported = %day.date,
                "Unparsable date in availability response, using alert date",
            );
            alert.date
        }
    }
}
