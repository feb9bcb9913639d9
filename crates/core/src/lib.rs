//! Pure domain logic for the slot watcher.
//!
//! Nothing in this crate touches the network or the database, so every
//! rule here (rate budgets, dispatch spacing, alert staleness, slot status
//! parsing) can be unit tested in isolation and shared by the repository
//! and worker layers.

pub mod error;
pub mod rate_budget;
pub mod staleness;
pub mod stagger;
pub mod status;
pub mod types;
