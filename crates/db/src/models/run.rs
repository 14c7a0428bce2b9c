//! Workflow-run and event-occurrence entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sentinel_core::types::{DbId, Timestamp};

/// The stateful instance of a workflow version for one correlation key.
///
/// `status` is a current-state cache; the occurrence log below is the audit
/// trail. Runs are never deleted by this core.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowRun {
    pub id: DbId,
    pub workflow_version_id: DbId,
    pub correlation_key: String,
    pub group_dims: Option<serde_json::Value>,
    pub status: String,
    pub last_node_key: Option<String>,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Append-only record of a normalized event applied to a run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventOccurrence {
    pub id: DbId,
    pub workflow_run_id: DbId,
    pub node_key: String,
    pub event_id: Option<String>,
    pub event_time_utc: Timestamp,
    pub received_at: Timestamp,
    pub payload_excerpt: Option<String>,
    pub is_late: bool,
    pub is_duplicate: bool,
    pub order_violation: bool,
}

/// DTO for appending an occurrence.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOccurrence {
    pub node_key: String,
    pub event_id: Option<String>,
    pub event_time_utc: Timestamp,
    pub received_at: Timestamp,
    pub payload_excerpt: Option<String>,
    pub is_late: bool,
    pub is_duplicate: bool,
    pub order_violation: bool,
}
