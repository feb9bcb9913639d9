//! Alert selector: which due alerts get rechecked this tick.

use std::sync::Arc;

use slotwatch_core::types::Timestamp;
use slotwatch_db::models::alert::BookAlert;

use crate::repository::SlotRepository;

/// Picks at most `limit` due alerts, least recently checked first, so no
/// alert starves when more alerts are due than the budget allows.
#[derive(Clone)]
pub struct AlertSelector {
    repo: Arc<dyn SlotRepository>,
}

impl AlertSelector {
    pub fn new(repo: Arc<dyn SlotRepository>) -> Self {
        Self { repo }
    }

    /// Due alerts for this tick. A non-positive limit selects nothing
    /// without touching the store.
    pub async fn select(&self, now: Timestamp, limit: i64) -> Result<Vec<BookAlert>, sqlx::Error> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        self.repo.due_alerts(now, limit).await
    }
}
