//! Rate budget calculator: requests allowed in the current tick.

use chrono::{Local, Timelike};
use slotwatch_core::rate_budget::{compute_budget, RateModifiers};
use slotwatch_core::types::Timestamp;

#[derive(Debug, Clone)]
pub struct RateBudgetCalculator {
    base_rate: i64,
    modifiers: Option<RateModifiers>,
}

impl RateBudgetCalculator {
    pub fn new(base_rate: i64, modifiers: Option<RateModifiers>) -> Self {
        Self {
            base_rate,
            modifiers,
        }
    }

    /// Budget for a tick starting at `now`, using the local hour of day.
    pub fn budget_at(&self, now: Timestamp) -> i64 {
        self.budget_for_hour(now.with_timezone(&Local).hour())
    }

    pub fn budget_for_hour(&self, hour: u32) -> i64 {
        let budget = compute_budget(self.base_rate, hour, self.modifiers.as_ref());
        if budget != self.base_rate {
            tracing::debug!(
                hour,
                base_rate = self.base_rate,
                budget,
                "Hour modifier applied to requests per minute"
            );
        }
        budget
    }
}
