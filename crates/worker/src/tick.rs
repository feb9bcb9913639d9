//! One per-minute scheduling cycle.

use slotwatch_core::types::Timestamp;

use crate::budget::RateBudgetCalculator;
use crate::dispatcher::{DispatchReport, StaggeredDispatcher};
use crate::error::WatchError;
use crate::notifications::NotificationEngine;
use crate::selector::AlertSelector;

/// Everything one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub budget: i64,
    pub selected: usize,
    pub dispatch: DispatchReport,
    pub created: usize,
    pub deactivated: usize,
    /// Persistence and publish failures from the notification passes.
    pub errors: Vec<WatchError>,
}

impl TickReport {
    /// Send every collected failure of the tick to the error log.
    pub fn log_errors(&self) {
        for e in self.dispatch.errors.iter().chain(&self.errors) {
            tracing::error!(budget = self.budget, error = %e, "Tick error");
        }
    }
}

/// Runs budget, selection, staggered dispatch and the notification passes
/// in that order.
#[derive(Clone)]
pub struct TickRunner {
    budget: RateBudgetCalculator,
    selector: AlertSelector,
    dispatcher: StaggeredDispatcher,
    notifications: NotificationEngine,
}

impl TickRunner {
    pub fn new(
        budget: RateBudgetCalculator,
        selector: AlertSelector,
        dispatcher: StaggeredDispatcher,
        notifications: NotificationEngine,
    ) -> Self {
        Self {
            budget,
            selector,
            dispatcher,
            notifications,
        }
    }

    /// Run one tick started at `now`.
    ///
    /// Every lookup of this tick is joined before notifications are derived,
    /// and cleanup runs after creation so a slot confirmed open in this pass
    /// is not retracted by it.
    pub async fn run_tick(&self, now: Timestamp) -> TickReport {
        let budget = self.budget.budget_at(now);
        let mut report = TickReport {
            budget,
            ..Default::default()
        };

        match self.selector.select(now, budget).await {
            Ok(alerts) => {
                report.selected = alerts.len();
                report.dispatch = self.dispatcher.dispatch_and_join(alerts, budget).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to select due alerts");
                report.errors.push(e.into());
            }
        }

        let created = self.notifications.create_notifications().await;
        report.created = created.affected;
        report.errors.extend(created.errors);

        let cleaned = self.notifications.cleanup_active_notifications().await;
        report.deactivated = cleaned.affected;
        report.errors.extend(cleaned.errors);

        tracing::info!(
            budget,
            selected = report.selected,
            checked = report.dispatch.checked,
            errored = report.dispatch.errored,
            created = report.created,
            deactivated = report.deactivated,
            errors = report.errors.len() + report.dispatch.errors.len(),
            "Tick finished",
        );

        report
    }
}
