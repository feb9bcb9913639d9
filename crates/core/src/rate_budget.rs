//! Requests-per-minute budget for the availability poller.
//!
//! The budget is the base rate, optionally scaled by an operator supplied
//! modifier for the current hour of day. Modifiers that are zero, negative
//! or not finite count as "no override" so a bad table can never silently
//! stop polling.

use std::collections::HashMap;

use crate::error::CoreError;

/// Requests per minute when nothing else is configured.
pub const DEFAULT_MAX_REQUESTS_PER_MINUTE: i64 = 5;

/// Per hour-of-day multipliers applied to the base rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateModifiers {
    by_hour: HashMap<u32, f64>,
}

impl RateModifiers {
    /// Parse the JSON form used in configuration: an object whose keys are
    /// hours `"0"`..`"23"` and whose values are multipliers, e.g.
    /// `{"2": 0.5, "9": 1.5}`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw_map: HashMap<String, f64> =
            serde_json::from_str(raw).map_err(|e| CoreError::Config {
                key: "REQUEST_MODIFIERS",
                reason: e.to_string(),
            })?;

        let mut by_hour = HashMap::with_capacity(raw_map.len());
        for (key, modifier) in raw_map {
            let hour: u32 = key.trim().parse().map_err(|_| CoreError::Config {
                key: "REQUEST_MODIFIERS",
                reason: format!("'{key}' is not an hour of day"),
            })?;
            if hour > 23 {
                return Err(CoreError::Config {
                    key: "REQUEST_MODIFIERS",
                    reason: format!("hour {hour} is out of range 0-23"),
                });
            }
            by_hour.insert(hour, modifier);
        }

        Ok(Self { by_hour })
    }

    /// Build a table directly from `(hour, modifier)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            by_hour: pairs.into_iter().collect(),
        }
    }

    /// The usable modifier for `hour`, if any.
    pub fn for_hour(&self, hour: u32) -> Option<f64> {
        self.by_hour
            .get(&hour)
            .copied()
            .filter(|m| m.is_finite() && *m > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.by_hour.is_empty()
    }
}

/// Compute how many availability requests may be issued this minute.
///
/// Returns `base_rate` unchanged when no usable modifier exists for `hour`,
/// otherwise `round(base_rate * modifier)` clamped at zero.
pub fn compute_budget(base_rate: i64, hour: u32, modifiers: Option<&RateModifiers>) -> i64 {
    match modifiers.and_then(|m| m.for_hour(hour)) {
        Some(modifier) => ((base_rate as f64) * modifier).round().max(0.0) as i64,
        None => base_rate,
    }
}
