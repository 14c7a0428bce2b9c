//! Stage-aggregate entity model and query parameters.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sentinel_core::types::{DbId, Timestamp};

/// A row from the `stage_aggregate` table: minute-bucketed counters per
/// (workflow version, group hash, node).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StageAggregate {
    pub id: DbId,
    pub workflow_version_id: DbId,
    pub group_dim_hash: String,
    pub node_key: String,
    pub bucket_start: Timestamp,
    pub in_flight: i32,
    pub completed: i32,
    pub late: i32,
    pub failed: i32,
}

/// Filter parameters for the aggregate window query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateWindowQuery {
    pub group_hash: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
}
