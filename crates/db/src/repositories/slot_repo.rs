//! Repository for the `book_slots` table.

use sqlx::PgPool;

use crate::models::alert::BookAlert;
use crate::models::slot::{BookSlot, SlotKey};

const COLUMNS: &str = "\
    id, restaurant_id, date, meal_period, party_mix, hour, \
    available, was_available, created_at, updated_at";

pub struct SlotRepo;

impl SlotRepo {
    /// Record a fresh observation of one slot.
    ///
    /// A single statement keyed on the slot's unique index: a new key is
    /// inserted with `was_available = false`; an existing key has its
    /// current `available` shifted into `was_available` before the new
    /// value is written. Concurrent upserts of the same key are serialised
    /// by the row lock PostgreSQL takes on conflict.
    pub async fn upsert(
        pool: &PgPool,
        key: &SlotKey,
        available: bool,
    ) -> Result<BookSlot, sqlx::Error> {
        let query = format!(
            "INSERT INTO book_slots \
                 (restaurant_id, date, meal_period, party_mix, hour, available, was_available) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE) \
             ON CONFLICT (restaurant_id, date, meal_period, party_mix, hour) DO UPDATE \
             SET was_available = book_slots.available, \
                 available = EXCLUDED.available, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookSlot>(&query)
            .bind(key.restaurant_id)
            .bind(key.date)
            .bind(&key.meal_period)
            .bind(key.party_mix)
            .bind(&key.hour)
            .bind(available)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_key(pool: &PgPool, key: &SlotKey) -> Result<Option<BookSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM book_slots \
             WHERE restaurant_id = $1 AND date = $2 AND meal_period = $3 \
               AND party_mix = $4 AND hour = $5"
        );
        sqlx::query_as::<_, BookSlot>(&query)
            .bind(key.restaurant_id)
            .bind(key.date)
            .bind(&key.meal_period)
            .bind(key.party_mix)
            .bind(&key.hour)
            .fetch_optional(pool)
            .await
    }

    /// Currently available slots matching an alert's restaurant, date,
    /// meal period and party size, ordered by hour.
    pub async fn list_available_for_alert(
        pool: &PgPool,
        alert: &BookAlert,
    ) -> Result<Vec<BookSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM book_slots \
             WHERE restaurant_id = $1 AND date = $2 AND meal_period = $3 \
               AND party_mix = $4 AND available \
             ORDER BY hour"
        );
        sqlx::query_as::<_, BookSlot>(&query)
            .bind(alert.restaurant_id)
            .bind(alert.date)
            .bind(&alert.meal_period)
            .bind(alert.party_mix)
            .fetch_all(pool)
            .await
    }
}
