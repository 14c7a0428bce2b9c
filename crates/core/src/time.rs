//! Time bucketing helpers.

use chrono::{Duration, DurationRound};

use crate::types::Timestamp;

/// Truncate a timestamp to the start of its UTC minute.
pub fn minute_bucket(ts: Timestamp) -> Timestamp {
    ts.duration_trunc(Duration::minutes(1)).unwrap_or(ts)
}
