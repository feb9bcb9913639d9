//! Client for the external reservation service.
//!
//! Wraps the two endpoints the watcher consumes (availability search and
//! restaurant catalogue) using [`reqwest`], and exposes them behind the
//! [`AvailabilityClient`] and [`RestaurantCatalog`] traits so the engine can
//! be driven by scripted fakes in tests.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiConfig, ReservationApi, TokenSource};
pub use error::AvailabilityError;
pub use models::{
    AvailabilitySearch, CatalogRestaurant, MealPeriodAvailability, MealSlot,
    RestaurantAvailability,
};

use async_trait::async_trait;

/// One availability lookup per (date, restaurant, party size).
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    async fn query(
        &self,
        search: &AvailabilitySearch,
    ) -> Result<Vec<RestaurantAvailability>, AvailabilityError>;
}

/// Listing of restaurants known to the reservation service.
#[async_trait]
pub trait RestaurantCatalog: Send + Sync {
    async fn restaurants(&self) -> Result<Vec<CatalogRestaurant>, AvailabilityError>;
}
