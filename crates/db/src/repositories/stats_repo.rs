//! Aggregate counters across the watch tables.

use sqlx::PgPool;

use crate::models::stats::WatchStatistics;

pub struct StatsRepo;

impl StatsRepo {
    pub async fn statistics(pool: &PgPool) -> Result<WatchStatistics, sqlx::Error> {
        sqlx::query_as::<_, WatchStatistics>(
            "SELECT \
                 (SELECT COUNT(*) FROM book_alerts WHERE NOT completed) AS active_alerts, \
                 (SELECT COUNT(*) FROM book_slots WHERE date > CURRENT_DATE) AS upcoming_slots, \
                 (SELECT COUNT(*) FROM book_notifications) AS sent_notifications",
        )
        .fetch_one(pool)
        .await
    }
}
