//! Alert creation requests received over Redis pub/sub.

use std::time::Duration;

use chrono::NaiveDate;
use futures::StreamExt;
use serde::Deserialize;
use slotwatch_core::types::{BookDate, DbId, DATE_FORMAT};
use slotwatch_db::models::alert::CreateBookAlert;
use slotwatch_db::repositories::{AlertRepo, RestaurantRepo};
use slotwatch_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::error::{WatchError, WatchResult};

/// Wait before resubscribing after the connection drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Wire form of an alert request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntakeMessage {
    #[serde(alias = "discordId")]
    recipient: String,
    restaurant_external_id: String,
    date: String,
    meal_period: String,
    party_mix: i32,
}

/// A validated alert request.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub recipient: String,
    pub restaurant_external_id: String,
    pub date: BookDate,
    pub meal_period: String,
    pub party_mix: i32,
}

/// Decode and validate one pub/sub payload.
pub fn parse_request(payload: &str) -> WatchResult<AlertRequest> {
    let message: IntakeMessage =
        serde_json::from_str(payload).map_err(|e| WatchError::InvalidAlert(e.to_string()))?;

    if message.recipient.trim().is_empty() {
        return Err(WatchError::InvalidAlert("recipient is empty".into()));
    }
    if message.restaurant_external_id.trim().is_empty() {
        return Err(WatchError::InvalidAlert("restaurantExternalId is empty".into()));
    }
    if message.meal_period.trim().is_empty() {
        return Err(WatchError::InvalidAlert("mealPeriod is empty".into()));
    }
    if message.party_mix <= 0 {
        return Err(WatchError::InvalidAlert(format!(
            "partyMix must be positive, got {}",
            message.party_mix
        )));
    }
    let date = NaiveDate::parse_from_str(message.date.trim(), DATE_FORMAT).map_err(|_| {
        WatchError::InvalidAlert(format!("'{}' is not a YYYY-MM-DD date", message.date))
    })?;

    Ok(AlertRequest {
        recipient: message.recipient,
        restaurant_external_id: message.restaurant_external_id,
        date,
        meal_period: message.meal_period,
        party_mix: message.party_mix,
    })
}

pub struct AlertIntake {
    pool: DbPool,
    client: redis::Client,
    channel: String,
}

impl AlertIntake {
    pub fn new(pool: DbPool, redis_url: &str, channel: String) -> Result<Self, redis::RedisError> {
        Ok(Self {
            pool,
            client: redis::Client::open(redis_url)?,
            channel,
        })
    }

    /// Consume requests until cancelled, resubscribing after failures.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(channel = %self.channel, "Alert intake started");

        loop {
            match self.consume(&cancel).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(channel = %self.channel, error = %e, "Alert intake connection lost");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }

        tracing::info!("Alert intake stopped");
    }

    /// Returns `Ok` only on cancellation.
    async fn consume(&self, cancel: &CancellationToken) -> Result<(), redis::RedisError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;
        let messages = pubsub.on_message();
        tokio::pin!(messages);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                message = messages.next() => {
                    let Some(message) = message else {
                        return Err(redis::RedisError::from((
                            redis::ErrorKind::IoError,
                            "subscription closed",
                        )));
                    };
                    let payload: String = match message.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping non-text alert request");
                            continue;
                        }
                    };
                    match self.handle(&payload).await {
                        Ok(alert_id) => tracing::info!(alert_id, "Alert created from request"),
                        Err(e) => tracing::warn!(error = %e, payload = %payload, "Alert request rejected"),
                    }
                }
            }
        }
    }

    async fn handle(&self, payload: &str) -> WatchResult<DbId> {
        let request = parse_request(payload)?;
        let restaurant =
            RestaurantRepo::find_by_external_id(&self.pool, &request.restaurant_external_id)
                .await?
                .ok_or_else(|| {
                    WatchError::UnknownRestaurant(request.restaurant_external_id.clone())
                })?;

        let id = AlertRepo::create(
            &self.pool,
            &CreateBookAlert {
                restaurant_id: restaurant.id,
                recipient: request.recipient,
                date: request.date,
                meal_period: request.meal_period,
                party_mix: request.party_mix,
            },
        )
        .await?;
        Ok(id)
    }
}
