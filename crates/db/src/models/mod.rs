//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the `Deserialize` DTOs used to create it.

pub mod alert;
pub mod auth_details;
pub mod notification;
pub mod restaurant;
pub mod slot;
pub mod stats;
