//! Repository for the `restaurants` table.

use slotwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::restaurant::{CreateRestaurant, Restaurant};

const COLUMNS: &str = "id, external_id, name, image_url, created_at";

pub struct RestaurantRepo;

impl RestaurantRepo {
    /// List every known restaurant, ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Restaurant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM restaurants ORDER BY name");
        sqlx::query_as::<_, Restaurant>(&query).fetch_all(pool).await
    }

    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Restaurant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM restaurants WHERE external_id = $1");
        sqlx::query_as::<_, Restaurant>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a restaurant unless one with the same external id exists.
    ///
    /// Returns the new id, or `None` when the restaurant was already known.
    pub async fn create_if_missing(
        pool: &PgPool,
        input: &CreateRestaurant,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO restaurants (external_id, name, image_url) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (external_id) DO NOTHING \
             RETURNING id",
        )
        .bind(&input.external_id)
        .bind(&input.name)
        .bind(&input.image_url)
        .fetch_optional(pool)
        .await
    }
}
