//! Repository for the `book_alerts` table.
//!
//! Every read joins `restaurants` so callers get a ready-to-use
//! [`BookAlert`] carrying the restaurant's external id and name.

use slotwatch_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::alert::{BookAlert, CreateBookAlert};

/// Select list shared by every alert query (`a` = alert, `r` = restaurant).
const SELECT_JOINED: &str = "\
    SELECT a.id, a.restaurant_id, r.external_id AS restaurant_external_id, \
           r.name AS restaurant_name, a.recipient, a.date, a.meal_period, \
           a.party_mix, a.completed, a.checked_at, a.check_count, \
           a.error_count, a.created_at, a.updated_at \
    FROM book_alerts a \
    JOIN restaurants r ON r.id = a.restaurant_id";

pub struct AlertRepo;

impl AlertRepo {
    /// Create an alert. It is due for a check immediately.
    pub async fn create(pool: &PgPool, input: &CreateBookAlert) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO book_alerts (restaurant_id, recipient, date, meal_period, party_mix) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(input.restaurant_id)
        .bind(&input.recipient)
        .bind(input.date)
        .bind(&input.meal_period)
        .bind(input.party_mix)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BookAlert>, sqlx::Error> {
        let query = format!("{SELECT_JOINED} WHERE a.id = $1");
        sqlx::query_as::<_, BookAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All alerts that are not completed.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<BookAlert>, sqlx::Error> {
        let query = format!("{SELECT_JOINED} WHERE NOT a.completed ORDER BY a.id");
        sqlx::query_as::<_, BookAlert>(&query).fetch_all(pool).await
    }

    /// Non-completed alerts last checked before `cutoff`, stalest first,
    /// capped at `limit` rows.
    pub async fn list_due(
        pool: &PgPool,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<BookAlert>, sqlx::Error> {
        let query = format!(
            "{SELECT_JOINED} \
             WHERE NOT a.completed AND a.checked_at < $1 \
             ORDER BY a.checked_at ASC, a.id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, BookAlert>(&query)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Record a successful availability check.
    pub async fn mark_checked(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE book_alerts \
             SET checked_at = NOW(), check_count = check_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed availability check. The recheck clock still advances.
    pub async fn mark_errored(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE book_alerts \
             SET checked_at = NOW(), error_count = error_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an alert completed. Returns `false` if it was already completed
    /// or does not exist.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE book_alerts SET completed = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT completed",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
