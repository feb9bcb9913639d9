//! Repository for the `auth_details` table.

use sqlx::PgPool;

use crate::models::auth_details::AuthDetails;

pub struct AuthDetailsRepo;

impl AuthDetailsRepo {
    /// The most recently stored credentials, if any.
    pub async fn latest(pool: &PgPool) -> Result<Option<AuthDetails>, sqlx::Error> {
        sqlx::query_as::<_, AuthDetails>(
            "SELECT id, access_token, refresh_token, created_at \
             FROM auth_details ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }
}
