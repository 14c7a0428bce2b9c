//! Due-at computation for workflow edges.
//!
//! An edge either carries an absolute time-of-day deadline (interpreted on
//! the event's UTC calendar day, rolling forward 24h if already past) or a
//! relative latency in seconds. Malformed deadline strings fall back to the
//! event time and are logged, never surfaced to the caller.

use chrono::{Duration, NaiveTime};

use crate::graph::EdgeDef;
use crate::types::Timestamp;

/// Compute when an expectation created by `edge` becomes overdue.
///
/// Precedence: absolute deadline, then `max_latency_sec > 0`, else the event
/// time itself (an already-due expectation).
pub fn compute_due_at(event_time: Timestamp, edge: &EdgeDef) -> Timestamp {
    if let Some(raw) = edge.absolute_deadline.as_deref() {
        return match parse_time_of_day(raw) {
            Some(time) => {
                let mut due = event_time.date_naive().and_time(time).and_utc();
                if due < event_time {
                    due += Duration::days(1);
                }
                due
            }
            None => {
                tracing::warn!(
                    deadline = raw,
                    to_node = %edge.to_node,
                    "Failed to parse absolute deadline, falling back to event time"
                );
                event_time
            }
        };
    }
    match edge.max_latency_sec {
        Some(secs) if secs > 0 => event_time + Duration::seconds(i64::from(secs)),
        _ => event_time,
    }
}

/// Parse a time-of-day string such as `"09:00"`, `"09:00:30"`, `"09:00Z"`,
/// or `"09:00+02:00"`.
///
/// Offsets are accepted but discarded: deadlines are evaluated at UTC.
fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    let without_zulu = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    // Keep only the local-time portion of offset forms like "09:00+02:00".
    let time_part = match without_zulu
        .char_indices()
        .find(|(i, c)| *i > 0 && (*c == '+' || *c == '-'))
    {
        Some((idx, _)) => &without_zulu[..idx],
        None => without_zulu,
    };
    NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()
}
