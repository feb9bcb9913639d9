//! Bearer tokens read from the `auth_details` table.

use async_trait::async_trait;
use slotwatch_availability::TokenSource;
use slotwatch_db::repositories::AuthDetailsRepo;
use slotwatch_db::DbPool;

/// Serves the most recently stored access token. Renewal happens outside
/// the worker; every request reads whatever is newest.
pub struct DbTokenSource {
    pool: DbPool,
}

impl DbTokenSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenSource for DbTokenSource {
    async fn access_token(&self) -> Option<String> {
        match AuthDetailsRepo::latest(&self.pool).await {
            Ok(Some(details)) if !details.access_token.is_empty() => Some(details.access_token),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load access token");
                None
            }
        }
    }
}
