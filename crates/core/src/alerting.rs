//! Alert lifecycle states, trigger reasons, and dedupe-key construction.

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Alert state
// ---------------------------------------------------------------------------

/// Lifecycle state of an alert.
///
/// A trigger on a `Resolved` alert reopens it to `Open`; triggers on `Ack`
/// or `Suppressed` alerts leave the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Open,
    Ack,
    Suppressed,
    Resolved,
}

impl AlertState {
    /// Lowercase wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Open => "open",
            AlertState::Ack => "ack",
            AlertState::Suppressed => "suppressed",
            AlertState::Resolved => "resolved",
        }
    }

    /// Parse a known state string (case-insensitive).
    pub fn parse(raw: &str) -> Option<AlertState> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Some(AlertState::Open),
            "ack" => Some(AlertState::Ack),
            "suppressed" => Some(AlertState::Suppressed),
            "resolved" => Some(AlertState::Resolved),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger reasons
// ---------------------------------------------------------------------------

/// Known alert trigger reasons.
pub mod reasons {
    /// An event arrived after at least one of its expectations was due.
    pub const SLA_MISSED: &str = "SLA_MISSED";
    /// A non-start node was reached without a cleared expectation.
    pub const ORDER_VIOLATION: &str = "ORDER_VIOLATION";
    /// The scheduler fired an expectation that never saw its event.
    pub const EXPECTED_MISSED: &str = "EXPECTED_MISSED";
}

// ---------------------------------------------------------------------------
// Dedupe keys
// ---------------------------------------------------------------------------

/// Dedupe key for rule-detected alerts: one alert per (version, node, item).
pub fn rule_dedupe_key(workflow_version_id: DbId, node_key: &str, correlation_key: &str) -> String {
    format!("{workflow_version_id}:{node_key}:{correlation_key}")
}

/// Dedupe key for scheduler-detected misses, scoped to one expectation
/// instance. Distinct per expectation so N missed occurrences produce N
/// alerts rather than coalescing onto the node-level key.
pub fn expectation_dedupe_key(expectation_id: DbId, due_at: Timestamp) -> String {
    format!("exp-{expectation_id}-{}", due_at.timestamp_millis())
}
