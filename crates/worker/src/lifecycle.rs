//! Alert lifecycle: check bookkeeping and completion of past alerts.

use std::sync::Arc;

use slotwatch_core::staleness::is_stale;
use slotwatch_core::types::Timestamp;
use slotwatch_db::models::alert::BookAlert;

use crate::error::{WatchError, WatchResult};
use crate::repository::SlotRepository;

/// Result of one [`AlertLifecycleManager::complete_stale`] run.
#[derive(Debug, Default)]
pub struct CompletionReport {
    pub completed: usize,
    pub errors: Vec<WatchError>,
}

#[derive(Clone)]
pub struct AlertLifecycleManager {
    repo: Arc<dyn SlotRepository>,
}

impl AlertLifecycleManager {
    pub fn new(repo: Arc<dyn SlotRepository>) -> Self {
        Self { repo }
    }

    /// Advance the recheck clock and count a successful check.
    pub async fn mark_checked(&self, alert: &BookAlert) -> WatchResult<()> {
        self.repo.mark_checked(alert.id).await?;
        Ok(())
    }

    /// Advance the recheck clock and count a failed check, so a
    /// permanently failing alert is retried at the normal cadence.
    pub async fn mark_errored(&self, alert: &BookAlert) -> WatchResult<()> {
        self.repo.mark_errored(alert.id).await?;
        Ok(())
    }

    /// Complete every active alert whose date is more than a day behind
    /// `now`. A failure on one alert does not stop the others.
    pub async fn complete_stale(&self, now: Timestamp) -> CompletionReport {
        let mut report = CompletionReport::default();

        let alerts = match self.repo.active_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                report.errors.push(e.into());
                return report;
            }
        };

        for alert in alerts.iter().filter(|a| is_stale(a.date, now)) {
            match self.repo.complete_alert(alert.id).await {
                Ok(true) => {
                    tracing::info!(alert_id = alert.id, date = %alert.date, "Alert completed");
                    report.completed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(alert_id = alert.id, error = %e, "Failed to complete alert");
                    report.errors.push(e.into());
                }
            }
        }

        report
    }
}
