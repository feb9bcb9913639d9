//! Periodic drivers: the per-minute tick loop and the daily maintenance loop.
//!
//! Both loops run until their [`CancellationToken`] fires. Each minute tick
//! is spawned as its own task, so a tick whose lookups are still running
//! never blocks the next tick from being scheduled.

use std::time::Duration;

use chrono::Utc;
use slotwatch_core::stagger::TICK_PERIOD;
use slotwatch_db::repositories::StatsRepo;
use slotwatch_db::DbPool;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::catalog_sync::CatalogSync;
use crate::lifecycle::AlertLifecycleManager;
use crate::tick::TickRunner;

/// How often the daily maintenance jobs run.
pub const DAILY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// How long shutdown waits for in-flight ticks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Run a tick every minute until cancelled. The first tick fires one period
/// after start; ticks missed while the runtime was stalled are skipped.
pub async fn run_minute_loop(runner: TickRunner, cancel: CancellationToken) {
    tracing::info!(period_secs = TICK_PERIOD.as_secs(), "Tick scheduler started");

    let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Tick scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                while let Some(finished) = ticks.try_join_next() {
                    if let Err(e) = finished {
                        tracing::error!(error = %e, "Tick task failed");
                    }
                }
                if !ticks.is_empty() {
                    tracing::debug!(in_flight = ticks.len(), "Previous tick still running");
                }
                let runner = runner.clone();
                ticks.spawn(async move {
                    runner.run_tick(Utc::now()).await.log_errors();
                });
            }
        }
    }

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(finished) = ticks.join_next().await {
            if let Err(e) = finished {
                tracing::error!(error = %e, "Tick task failed");
            }
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(in_flight = ticks.len(), "Aborting ticks still running at shutdown");
        ticks.abort_all();
    }
}

/// Once-a-day maintenance: stale alert completion, catalogue sync and a
/// statistics log line.
pub struct DailyJobs {
    pool: DbPool,
    lifecycle: AlertLifecycleManager,
    catalog: Option<CatalogSync>,
}

impl DailyJobs {
    pub fn new(pool: DbPool, lifecycle: AlertLifecycleManager, catalog: Option<CatalogSync>) -> Self {
        Self {
            pool,
            lifecycle,
            catalog,
        }
    }

    /// Run every job once. Failures are logged; one job failing does not
    /// skip the others.
    pub async fn run_once(&self) {
        let report = self.lifecycle.complete_stale(Utc::now()).await;
        tracing::info!(
            completed = report.completed,
            errors = report.errors.len(),
            "Stale alerts completed",
        );
        for e in &report.errors {
            tracing::error!(error = %e, "Stale alert completion failed");
        }

        if let Some(catalog) = &self.catalog {
            if let Err(e) = catalog.run().await {
                tracing::error!(error = %e, "Restaurant catalogue sync failed");
            }
        }

        match StatsRepo::statistics(&self.pool).await {
            Ok(stats) => tracing::info!(
                active_alerts = stats.active_alerts,
                upcoming_slots = stats.upcoming_slots,
                sent_notifications = stats.sent_notifications,
                "Watch statistics",
            ),
            Err(e) => tracing::error!(error = %e, "Failed to load statistics"),
        }
    }
}

/// Run the daily jobs at startup and then every 24 hours until cancelled.
pub async fn run_daily_loop(jobs: DailyJobs, cancel: CancellationToken) {
    tracing::info!("Daily scheduler started");

    let mut interval = tokio::time::interval(DAILY_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Daily scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = jobs.run_once() => {}
                }
            }
        }
    }
}
