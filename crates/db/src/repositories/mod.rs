//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod auth_details_repo;
pub mod notification_repo;
pub mod restaurant_repo;
pub mod slot_repo;
pub mod stats_repo;

pub use alert_repo::AlertRepo;
pub use auth_details_repo::AuthDetailsRepo;
pub use notification_repo::NotificationRepo;
pub use restaurant_repo::RestaurantRepo;
pub use slot_repo::SlotRepo;
pub use stats_repo::StatsRepo;
