//! Staggered dispatch of availability lookups within one tick.
//!
//! Alert `i` of a tick is looked up `i * floor(60 / budget)` seconds after
//! the tick starts. Every lookup runs as its own task in a [`JoinSet`], so a
//! slow or failing lookup never delays or cancels the others. The tick joins
//! the set before deriving notifications.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use slotwatch_availability::{AvailabilityClient, AvailabilityError, AvailabilitySearch};
use slotwatch_core::stagger::schedule_offsets;
use slotwatch_core::types::DbId;
use slotwatch_db::models::alert::BookAlert;
use tokio::task::JoinSet;

use crate::error::WatchError;
use crate::ingester::{AvailabilityIngester, IngestSummary};
use crate::lifecycle::AlertLifecycleManager;

/// What happened to one alert's lookup.
#[derive(Debug)]
pub enum AlertOutcome {
    Checked {
        alert_id: DbId,
        ingest: IngestSummary,
        bookkeeping: Option<WatchError>,
    },
    Errored {
        alert_id: DbId,
        error: AvailabilityError,
        bookkeeping: Option<WatchError>,
    },
}

/// Aggregate of one joined dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub scheduled: usize,
    pub checked: usize,
    pub errored: usize,
    pub panicked: usize,
    pub slots_upserted: usize,
    /// Persistence failures from ingestion and alert bookkeeping.
    pub errors: Vec<WatchError>,
}

impl DispatchReport {
    fn record(&mut self, outcome: AlertOutcome) {
        match outcome {
            AlertOutcome::Checked {
                ingest,
                bookkeeping,
                ..
            } => {
                self.checked += 1;
                self.slots_upserted += ingest.upserted;
                self.errors.extend(ingest.failed);
                self.errors.extend(bookkeeping);
            }
            AlertOutcome::Errored { bookkeeping, .. } => {
                self.errored += 1;
                self.errors.extend(bookkeeping);
            }
        }
    }
}

/// One alert's unit of work: look up, then record and ingest.
#[derive(Clone)]
struct AlertChecker {
    client: Arc<dyn AvailabilityClient>,
    lifecycle: AlertLifecycleManager,
    ingester: AvailabilityIngester,
}

impl AlertChecker {
    async fn check(&self, alert: BookAlert) -> AlertOutcome {
        let search = AvailabilitySearch {
            date: alert.date,
            restaurant_id: alert.restaurant_external_id.clone(),
            party_mix: alert.party_mix,
        };

        match self.client.query(&search).await {
            Ok(response) => {
                let bookkeeping = self.lifecycle.mark_checked(&alert).await.err();
                if let Some(e) = &bookkeeping {
                    tracing::error!(alert_id = alert.id, error = %e, "Failed to mark alert checked");
                }
                let ingest = self.ingester.ingest(&response, &alert).await;
                tracing::debug!(
                    alert_id = alert.id,
                    restaurant = %alert.restaurant_external_id,
                    slots = ingest.upserted,
                    "Availability ingested",
                );
                AlertOutcome::Checked {
                    alert_id: alert.id,
                    ingest,
                    bookkeeping,
                }
            }
            Err(error) => {
                tracing::error!(
                    alert_id = alert.id,
                    date = %alert.date,
                    restaurant = %alert.restaurant_external_id,
                    party_mix = alert.party_mix,
                    http_status = ?error.http_status(),
                    raw_body = error.raw_body().unwrap_or_default(),
                    error = %error,
                    "Availability lookup failed",
                );
                let bookkeeping = self.lifecycle.mark_errored(&alert).await.err();
                if let Some(e) = &bookkeeping {
                    tracing::error!(alert_id = alert.id, error = %e, "Failed to mark alert errored");
                }
                AlertOutcome::Errored {
                    alert_id: alert.id,
                    error,
                    bookkeeping,
                }
            }
        }
    }
}

/// Alert ids whose lookup has been scheduled and not yet finished.
#[derive(Clone, Default)]
struct InFlight {
    ids: Arc<Mutex<HashSet<DbId>>>,
}

impl InFlight {
    /// Claim `id`, or `None` if a lookup for it is already pending.
    fn claim(&self, id: DbId) -> Option<InFlightClaim> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.insert(id).then(|| InFlightClaim {
            ids: Arc::clone(&self.ids),
            id,
        })
    }
}

/// Releases its id when the unit finishes, panics or is aborted.
struct InFlightClaim {
    ids: Arc<Mutex<HashSet<DbId>>>,
    id: DbId,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Clones share the in-flight set, so overlapping ticks never look up the
/// same alert twice at once.
#[derive(Clone)]
pub struct StaggeredDispatcher {
    checker: AlertChecker,
    in_flight: InFlight,
}

impl StaggeredDispatcher {
    pub fn new(
        client: Arc<dyn AvailabilityClient>,
        lifecycle: AlertLifecycleManager,
        ingester: AvailabilityIngester,
    ) -> Self {
        Self {
            checker: AlertChecker {
                client,
                lifecycle,
                ingester,
            },
            in_flight: InFlight::default(),
        }
    }

    /// Schedule one lookup per alert at its staggered offset from now.
    ///
    /// A budget of zero or less schedules nothing. Alerts whose lookup from
    /// an earlier dispatch is still pending are skipped. Dropping the
    /// returned set aborts lookups that have not finished.
    pub fn dispatch(&self, alerts: Vec<BookAlert>, budget: i64) -> JoinSet<AlertOutcome> {
        let mut set = JoinSet::new();
        if budget <= 0 {
            return set;
        }

        let claimed: Vec<(BookAlert, InFlightClaim)> = alerts
            .into_iter()
            .filter_map(|alert| match self.in_flight.claim(alert.id) {
                Some(claim) => Some((alert, claim)),
                None => {
                    tracing::debug!(alert_id = alert.id, "Lookup still in flight, skipping alert");
                    None
                }
            })
            .collect();
        let offsets = schedule_offsets(claimed.len(), budget);

        for ((alert, claim), offset) in claimed.into_iter().zip(offsets) {
            let checker = self.checker.clone();
            set.spawn(async move {
                let _claim = claim;
                if !offset.is_zero() {
                    tokio::time::sleep(offset).await;
                }
                checker.check(alert).await
            });
        }

        set
    }

    /// Dispatch and wait for every lookup to finish.
    pub async fn dispatch_and_join(&self, alerts: Vec<BookAlert>, budget: i64) -> DispatchReport {
        let mut set = self.dispatch(alerts, budget);
        let mut report = DispatchReport {
            scheduled: set.len(),
            ..Default::default()
        };

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Availability check task failed");
                    report.panicked += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::test_support::{day_with_slots, InMemoryRepository, ScriptedClient};

    fn dispatcher(repo: &Arc<InMemoryRepository>, client: &Arc<ScriptedClient>) -> StaggeredDispatcher {
        StaggeredDispatcher::new(
            client.clone(),
            AlertLifecycleManager::new(repo.clone()),
            AvailabilityIngester::new(repo.clone()),
        )
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn lookups_are_spaced_by_budget() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let alerts: Vec<BookAlert> = (0..3)
            .map(|_| repo.alert(repo.add_alert(restaurant, "2024-07-01")))
            .collect();

        let start = Instant::now();
        let report = dispatcher(&repo, &client).dispatch_and_join(alerts, 5).await;

        assert_eq!(report.scheduled, 3);
        assert_eq!(report.checked, 3);
        let offsets: Vec<Duration> = client.calls().iter().map(|c| c.at - start).collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_secs(12), Duration::from_secs(24)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_budget_schedules_nothing() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let alerts = vec![repo.alert(repo.add_alert(restaurant, "2024-07-01"))];

        let report = dispatcher(&repo, &client).dispatch_and_join(alerts.clone(), 0).await;
        assert_eq!(report.scheduled, 0);
        let report = dispatcher(&repo, &client).dispatch_and_join(alerts, -3).await;
        assert_eq!(report.scheduled, 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_uses_alert_search_fields() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let alert = repo.alert(repo.add_alert(restaurant, "2024-07-01"));

        dispatcher(&repo, &client).dispatch_and_join(vec![alert.clone()], 5).await;

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search.restaurant_id, "R1");
        assert_eq!(calls[0].search.date, alert.date);
        assert_eq!(calls[0].search.party_mix, 2);
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_affect_other_lookups() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let good = repo.add_restaurant("R1", "Chez R");
        let bad = repo.add_restaurant("R2", "Broken");
        client.respond("R1", day_with_slots("2024-07-01", "dinner", &[("19:00", "true")]));
        client.fail("R2", 503);

        let first = repo.add_alert(good, "2024-07-01");
        let failing = repo.add_alert(bad, "2024-07-01");
        let last = repo.add_alert(good, "2024-07-01");
        let alerts = vec![repo.alert(first), repo.alert(failing), repo.alert(last)];

        let start = Instant::now();
        let report = dispatcher(&repo, &client).dispatch_and_join(alerts, 5).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.errored, 1);
        assert_eq!(report.panicked, 0);
        assert!(report.errors.is_empty());

        let offsets: Vec<Duration> = client.calls().iter().map(|c| c.at - start).collect();
        assert_eq!(offsets[2], Duration::from_secs(24));

        assert_eq!(repo.alert(failing).error_count, 1);
        assert_eq!(repo.alert(failing).check_count, 0);
        assert_eq!(repo.alert(first).check_count, 1);
        assert_eq!(repo.alert(last).check_count, 1);
        // No ingestion for the failed alert.
        assert!(repo.slot(bad, "2024-07-01", "dinner", 2, "19:00").is_none());
        assert!(repo.slot(good, "2024-07-01", "dinner", 2, "19:00").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn bookkeeping_failures_are_reported() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let alert = repo.alert(repo.add_alert(restaurant, "2024-07-01"));
        repo.fail_marks();

        let report = dispatcher(&repo, &client).dispatch_and_join(vec![alert], 5).await;
        assert_eq!(report.checked, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_lookup_is_not_scheduled_again() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let pending = repo.alert(repo.add_alert(restaurant, "2024-07-01"));
        let other = repo.alert(repo.add_alert(restaurant, "2024-07-01"));
        let dispatcher = dispatcher(&repo, &client);

        let mut earlier = dispatcher.dispatch(vec![other.clone(), pending.clone()], 5);

        // The next tick overlaps while both lookups are still pending.
        let overlapping = dispatcher.clone().dispatch_and_join(vec![pending.clone()], 5).await;
        assert_eq!(overlapping.scheduled, 0);

        while earlier.join_next().await.is_some() {}
        assert_eq!(client.calls().len(), 2);
        assert_eq!(repo.alert(pending.id).check_count, 1);

        let later = dispatcher.dispatch_and_join(vec![pending], 5).await;
        assert_eq!(later.scheduled, 1);
        assert_eq!(later.checked, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_lookup_releases_its_alert() {
        let repo = Arc::new(InMemoryRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let restaurant = repo.add_restaurant("R1", "Chez R");
        let first = repo.alert(repo.add_alert(restaurant, "2024-07-01"));
        let second = repo.alert(repo.add_alert(restaurant, "2024-07-01"));
        let dispatcher = dispatcher(&repo, &client);

        // The second alert sleeps to its 12s offset; dropping the set aborts it.
        let mut set = dispatcher.dispatch(vec![first, second.clone()], 5);
        set.join_next().await;
        drop(set);
        tokio::time::sleep(Duration::from_millis(1)).await;

        let report = dispatcher.dispatch_and_join(vec![second], 5).await;
        assert_eq!(report.scheduled, 1);
        assert_eq!(report.checked, 1);
    }
}
