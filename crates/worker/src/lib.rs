//! Availability watcher engine.
//!
//! Per minute the [`tick::TickRunner`] asks the [`budget`] how many
//! lookups are allowed, picks that many due alerts with the [`selector`],
//! spreads their lookups across the minute with the [`dispatcher`], folds
//! each response into slot rows via the [`ingester`], and finally derives
//! and retracts notifications with the [`notifications`] engine. The
//! [`lifecycle`] manager keeps alert counters and completes stale alerts
//! once a day.

pub mod budget;
pub mod catalog_sync;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ingester;
pub mod intake;
pub mod lifecycle;
pub mod notifications;
pub mod repository;
pub mod scheduler;
pub mod selector;
pub mod tick;
pub mod tokens;

#[cfg(test)]
pub(crate) mod test_support;
