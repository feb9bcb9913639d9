//! Even spacing of availability requests across one tick.

use std::time::Duration;

/// Length of one scheduling tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(60);

/// Seconds between two consecutive requests for the given budget, i.e.
/// `floor(60 / budget)`. `None` when the budget allows no request at all.
pub fn spacing_secs(budget: i64) -> Option<u64> {
    if budget <= 0 {
        return None;
    }
    Some(TICK_PERIOD.as_secs() / budget as u64)
}

/// Start offsets, relative to the tick start, for `count` requests under
/// `budget`. Request `i` starts at `i * floor(60 / budget)` seconds.
///
/// Returns an empty schedule when the budget is zero or negative.
pub fn schedule_offsets(count: usize, budget: i64) -> Vec<Duration> {
    let Some(spacing) = spacing_secs(budget) else {
        return Vec::new();
    };
    (0..count as u64)
        .map(|i| Duration::from_secs(i * spacing))
        .collect()
}
