//! Outbound outcome contracts and the scheduler miss signal.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sentinel_core::types::DbId;
use sentinel_core::Severity;

// ---------------------------------------------------------------------------
// RuleEvaluated
// ---------------------------------------------------------------------------

/// Outcome of evaluating one event against one workflow version.
///
/// Consumed by the Stage Aggregator: the arrival node receives the
/// completed/late/failed deltas, and each entry of `in_flight_deltas` is a
/// pure in-flight adjustment for that node (negative for cleared
/// expectations on the arrival node, positive for newly expected ones).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluated {
    pub workflow_version_id: DbId,
    pub workflow_run_id: DbId,
    pub node: String,
    pub correlation_key: String,
    pub status: Severity,
    pub late: bool,
    pub order_violation: bool,
    pub completed_delta: i32,
    pub late_delta: i32,
    pub failed_delta: i32,
    #[serde(default)]
    pub in_flight_deltas: HashMap<String, i32>,
    #[serde(default)]
    pub group: Value,
    pub group_hash: String,
    pub event_time: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AlertTrigger
// ---------------------------------------------------------------------------

/// A condition worth alerting on, coalesced downstream by `dedupe_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTrigger {
    pub dedupe_key: String,
    pub workflow_version_id: DbId,
    pub workflow_run_id: Option<DbId>,
    pub node: String,
    pub correlation_key: String,
    pub severity: Severity,
    /// One of the constants in [`sentinel_core::alerting::reasons`].
    pub reason: String,
    pub triggered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SyntheticMissed
// ---------------------------------------------------------------------------

/// A claimed, overdue expectation turned into a miss signal.
///
/// Each carries its own expectation-scoped dedupe key so distinct missed
/// occurrences raise distinct alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticMissed {
    pub expectation_id: DbId,
    pub workflow_run_id: DbId,
    pub from_node: String,
    pub to_node: String,
    pub due_at: DateTime<Utc>,
    pub severity: String,
    pub dedupe_key: String,
}
