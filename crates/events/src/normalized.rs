//! Inbound normalized-event contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized business event as produced by the ingestion layer.
///
/// `event_time` and `correlation_key` are upstream invariants enforced at
/// ingestion; this core assumes both are present and meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Source-assigned id used for duplicate detection within a run.
    /// Events without an id are never treated as duplicates.
    #[serde(default)]
    pub event_id: Option<String>,

    /// System the event originated from (traceability only).
    #[serde(default)]
    pub source_system: Option<String>,

    /// Event type, matched against workflow node definitions.
    pub event_type: String,

    /// When the event happened in the source system (UTC).
    pub event_time: DateTime<Utc>,

    /// When the platform received the event (UTC).
    pub received_at: DateTime<Utc>,

    /// Explicit single-workflow targeting, if any.
    #[serde(default)]
    pub workflow_key: Option<String>,

    /// Explicit multi-workflow targeting; takes precedence over
    /// `workflow_key` when non-empty.
    #[serde(default)]
    pub workflow_keys: Option<Vec<String>>,

    /// External identifier tying all events of one business instance.
    pub correlation_key: String,

    /// Dimension map used for dashboard partitioning, e.g. `{"region":"NY"}`.
    #[serde(default)]
    pub group: Value,

    /// Free-form source payload; only an excerpt is persisted.
    #[serde(default)]
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_minimal_fields() {
        let event: NormalizedEvent = serde_json::from_str(
            r#"{
                "event_type": "ORDER_INGEST",
                "event_time": "2024-01-01T08:00:00Z",
                "received_at": "2024-01-01T08:00:01Z",
                "correlation_key": "order-1"
            }"#,
        )
        .unwrap();
        assert!(event.event_id.is_none());
        assert!(event.workflow_keys.is_none());
        assert!(event.group.is_null());
    }
}
