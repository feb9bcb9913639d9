use slotwatch_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `auth_details` table. The newest row holds the token used
/// for outbound requests.
#[derive(Debug, Clone, FromRow)]
pub struct AuthDetails {
    pub id: DbId,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: Timestamp,
}
