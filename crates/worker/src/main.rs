use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotwatch_availability::ReservationApi;
use slotwatch_events::{EventBus, NotificationPublisher, NotificationRelay, RedisPublisher};
use slotwatch_worker::budget::RateBudgetCalculator;
use slotwatch_worker::catalog_sync::CatalogSync;
use slotwatch_worker::config::{LogFormat, WorkerConfig};
use slotwatch_worker::dispatcher::StaggeredDispatcher;
use slotwatch_worker::ingester::AvailabilityIngester;
use slotwatch_worker::intake::AlertIntake;
use slotwatch_worker::lifecycle::AlertLifecycleManager;
use slotwatch_worker::notifications::NotificationEngine;
use slotwatch_worker::repository::{PgSlotRepository, SlotRepository};
use slotwatch_worker::scheduler::{self, DailyJobs};
use slotwatch_worker::selector::AlertSelector;
use slotwatch_worker::tick::TickRunner;
use slotwatch_worker::tokens::DbTokenSource;

/// How long shutdown waits for each background task.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(35);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid configuration")?;

    // --- Tracing ---
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotwatch_worker=debug,slotwatch_db=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        max_requests_per_minute = config.max_requests_per_minute,
        hour_modifiers = config.request_modifiers.is_some(),
        redis = config.redis_url.is_some(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = slotwatch_db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    slotwatch_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    slotwatch_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus and relay ---
    let event_bus = Arc::new(EventBus::default());

    let downstream: Option<Arc<dyn NotificationPublisher>> = match &config.redis_url {
        Some(url) => {
            let publisher = RedisPublisher::connect(url, config.notification_channel.clone())
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!(channel = %publisher.channel(), "Relaying notifications to Redis");
            Some(Arc::new(publisher))
        }
        None => {
            tracing::info!("REDIS_URL not set, notifications are only logged");
            None
        }
    };
    let relay_handle = tokio::spawn(NotificationRelay::new(downstream).run(event_bus.subscribe()));

    // --- Reservation service ---
    let api = Arc::new(
        ReservationApi::new(
            config.api.clone(),
            Some(Arc::new(DbTokenSource::new(pool.clone()))),
        )
        .context("Failed to build reservation service client")?,
    );

    // --- Engine ---
    let repo: Arc<dyn SlotRepository> = Arc::new(PgSlotRepository::new(pool.clone()));
    let lifecycle = AlertLifecycleManager::new(Arc::clone(&repo));
    let runner = TickRunner::new(
        RateBudgetCalculator::new(
            config.max_requests_per_minute,
            config.request_modifiers.clone(),
        ),
        AlertSelector::new(Arc::clone(&repo)),
        StaggeredDispatcher::new(
            api.clone(),
            lifecycle.clone(),
            AvailabilityIngester::new(Arc::clone(&repo)),
        ),
        NotificationEngine::new(Arc::clone(&repo), event_bus.clone()),
    );

    let catalog = match (&config.api.graphql_endpoint, &config.api.restaurants_query) {
        (Some(_), Some(_)) => Some(CatalogSync::new(pool.clone(), api.clone())),
        _ => {
            tracing::info!("Catalogue endpoint not configured, restaurant sync disabled");
            None
        }
    };

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let mut handles = vec![
        tokio::spawn(scheduler::run_minute_loop(runner, cancel.clone())),
        tokio::spawn(scheduler::run_daily_loop(
            DailyJobs::new(pool.clone(), lifecycle, catalog),
            cancel.clone(),
        )),
    ];

    if let Some(url) = &config.redis_url {
        let intake = AlertIntake::new(pool.clone(), url, config.alert_channel.clone())
            .context("Invalid REDIS_URL")?;
        handles.push(tokio::spawn(intake.run(cancel.clone())));
    }

    tracing::info!("Worker started");

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    for handle in handles {
        if tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await.is_err() {
            tracing::warn!("Background task did not stop in time");
        }
    }

    // The relay exits once every bus handle is gone.
    drop(event_bus);
    match tokio::time::timeout(Duration::from_secs(5), relay_handle).await {
        Ok(Ok(delivered)) => tracing::info!(delivered, "Notification relay stopped"),
        _ => tracing::warn!("Notification relay did not stop cleanly"),
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
