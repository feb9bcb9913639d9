//! Daily import of restaurants from the reservation service catalogue.

use std::collections::HashSet;
use std::sync::Arc;

use slotwatch_availability::{CatalogRestaurant, RestaurantCatalog};
use slotwatch_db::models::restaurant::CreateRestaurant;
use slotwatch_db::repositories::RestaurantRepo;
use slotwatch_db::DbPool;

use crate::error::WatchResult;

/// Catalogue entries that accept bookings and are not stored yet. Each
/// external id appears at most once.
pub fn restaurants_to_create(
    catalog: &[CatalogRestaurant],
    known: &HashSet<String>,
) -> Vec<CreateRestaurant> {
    let mut seen = HashSet::new();
    catalog
        .iter()
        .filter(|r| r.booking_available && !r.external_id.is_empty())
        .filter(|r| !known.contains(&r.external_id))
        .filter(|r| seen.insert(r.external_id.clone()))
        .map(|r| CreateRestaurant {
            external_id: r.external_id.clone(),
            name: r.name.clone(),
            image_url: r.hero_media.url.clone(),
        })
        .collect()
}

pub struct CatalogSync {
    pool: DbPool,
    catalog: Arc<dyn RestaurantCatalog>,
}

impl CatalogSync {
    pub fn new(pool: DbPool, catalog: Arc<dyn RestaurantCatalog>) -> Self {
        Self { pool, catalog }
    }

    /// Fetch the catalogue and insert new restaurants. Returns how many
    /// rows were created; existing restaurants are never updated.
    pub async fn run(&self) -> WatchResult<usize> {
        let catalog = self.catalog.restaurants().await?;
        let known: HashSet<String> = RestaurantRepo::list(&self.pool)
            .await?
            .into_iter()
            .map(|r| r.external_id)
            .collect();

        let mut created = 0;
        for input in restaurants_to_create(&catalog, &known) {
            if let Some(id) = RestaurantRepo::create_if_missing(&self.pool, &input).await? {
                tracing::info!(
                    restaurant_id = id,
                    external_id = %input.external_id,
                    name = %input.name,
                    "Restaurant added",
                );
                created += 1;
            }
        }

        tracing::info!(catalog = catalog.len(), created, "Restaurant catalogue synced");
        Ok(created)
    }
}
