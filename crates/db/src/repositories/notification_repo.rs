//! Repository for the `book_notifications` table.
//!
//! Rows are never deleted. A notification goes from active to inactive
//! once; a later reappearance of the slot creates a fresh row.

use slotwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{ActiveNotification, BookNotification};

const COLUMNS: &str = "id, book_alert_id, book_slot_id, active, created_at, deactivated_at";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Whether an active notification exists for the (alert, slot) pair.
    pub async fn active_exists(
        pool: &PgPool,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM book_notifications \
                 WHERE book_alert_id = $1 AND book_slot_id = $2 AND active \
             )",
        )
        .bind(alert_id)
        .bind(slot_id)
        .fetch_one(pool)
        .await
    }

    /// Create an active notification for the pair.
    ///
    /// Returns `None` when another active row for the same pair already
    /// exists (enforced by the partial unique index), so racing callers
    /// can never create a duplicate.
    pub async fn create_active(
        pool: &PgPool,
        alert_id: DbId,
        slot_id: DbId,
    ) -> Result<Option<BookNotification>, sqlx::Error> {
        let query = format!(
            "INSERT INTO book_notifications (book_alert_id, book_slot_id, active) \
             VALUES ($1, $2, TRUE) \
             ON CONFLICT (book_alert_id, book_slot_id) WHERE active DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookNotification>(&query)
            .bind(alert_id)
            .bind(slot_id)
            .fetch_optional(pool)
            .await
    }

    /// Every active notification with its slot's current availability.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<ActiveNotification>, sqlx::Error> {
        sqlx::query_as::<_, ActiveNotification>(
            "SELECT n.id, n.book_alert_id, n.book_slot_id, s.available AS slot_available \
             FROM book_notifications n \
             JOIN book_slots s ON s.id = n.book_slot_id \
             WHERE n.active \
             ORDER BY n.id",
        )
        .fetch_all(pool)
        .await
    }

    /// Deactivate a notification. Returns `false` if it was not active.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE book_notifications \
             SET active = FALSE, deactivated_at = NOW() \
             WHERE id = $1 AND active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_alert(
        pool: &PgPool,
        alert_id: DbId,
    ) -> Result<Vec<BookNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM book_notifications \
             WHERE book_alert_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, BookNotification>(&query)
            .bind(alert_id)
            .fetch_all(pool)
            .await
    }
}
