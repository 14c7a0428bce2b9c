//! Workflow configuration entity models (read-only for this core).

use serde::Serialize;
use sqlx::FromRow;
use sentinel_core::graph::{EdgeDef, NodeDef};
use sentinel_core::types::{DbId, Timestamp};
use sentinel_core::Severity;

/// A row from the `workflow` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: DbId,
    pub key: String,
    pub name: String,
    pub owner: Option<String>,
    pub active_version_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// A row from the `workflow_version` table. Immutable once published.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowVersion {
    pub id: DbId,
    pub workflow_id: DbId,
    pub version_num: i32,
    pub status: String,
    pub created_by: Option<String>,
    pub created_at: Timestamp,
    pub published_at: Option<Timestamp>,
}

/// A row from the `workflow_node` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowNodeRow {
    pub id: DbId,
    pub workflow_version_id: DbId,
    pub node_key: String,
    pub event_type: String,
    pub is_start: bool,
    pub is_terminal: bool,
}

impl WorkflowNodeRow {
    /// Convert into the pure graph node definition.
    pub fn into_def(self) -> NodeDef {
        NodeDef {
            node_key: self.node_key,
            event_type: self.event_type,
            is_start: self.is_start,
            is_terminal: self.is_terminal,
        }
    }
}

/// A `workflow_edge` row joined with its endpoint node keys.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowEdgeRow {
    pub from_node_key: String,
    pub to_node_key: String,
    pub max_latency_sec: Option<i32>,
    pub absolute_deadline: Option<String>,
    pub optional: bool,
    pub expected_count: i32,
    pub severity: Option<String>,
}

impl WorkflowEdgeRow {
    /// Convert into the pure graph edge definition, normalizing severity.
    pub fn into_def(self) -> EdgeDef {
        EdgeDef {
            from_node: self.from_node_key,
            to_node: self.to_node_key,
            max_latency_sec: self.max_latency_sec,
            absolute_deadline: self.absolute_deadline,
            optional: self.optional,
            expected_count: self.expected_count,
            severity: Severity::normalize(self.severity.as_deref()),
        }
    }
}
