//! Wire types of the reservation service.

use serde::{Deserialize, Serialize};
use slotwatch_core::types::BookDate;

/// Request body of the availability search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySearch {
    /// Serialized as `YYYY-MM-DD`.
    pub date: BookDate,
    /// The restaurant's id on the reservation service.
    pub restaurant_id: String,
    pub party_mix: i32,
}

/// Availability of one restaurant on one day.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestaurantAvailability {
    pub start_time: String,
    pub end_time: String,
    /// Day this entry describes, `YYYY-MM-DD`.
    pub date: String,
    pub status: String,
    pub meal_periods: Vec<MealPeriodAvailability>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPeriodAvailability {
    pub meal_period: String,
    pub slot_list: Vec<MealSlot>,
}

/// One bookable hour. `available` is the service's status string; only
/// `"true"` means open (see [`slotwatch_core::status::is_available`]).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MealSlot {
    pub time: String,
    pub available: String,
}

/// A restaurant as listed by the catalogue endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRestaurant {
    pub name: String,
    #[serde(rename = "id")]
    pub external_id: String,
    /// Whether the restaurant accepts bookings through the service.
    #[serde(rename = "drsApp", default)]
    pub booking_available: bool,
    #[serde(rename = "heroMediaMobile", default)]
    pub hero_media: HeroMedia,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeroMedia {
    #[serde(default)]
    pub url: String,
}

/// Envelope of the catalogue endpoint's response.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogResponse {
    pub data: CatalogData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogData {
    #[serde(default)]
    pub activities: Vec<CatalogRestaurant>,
}
