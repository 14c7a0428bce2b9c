//! Expectation entity models.

use serde::Serialize;
use sqlx::FromRow;
use sentinel_core::types::{DbId, Timestamp};

/// A row from the `expectation` table: one pending deadline for one
/// expected occurrence at `to_node_key`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Expectation {
    pub id: DbId,
    pub workflow_run_id: DbId,
    pub from_node_key: String,
    pub to_node_key: String,
    pub due_at: Timestamp,
    pub severity: String,
    pub status: String,
    pub lock_owner: Option<String>,
    pub fired_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Slim projection returned when an arrival clears open expectations.
#[derive(Debug, Clone, FromRow)]
pub struct ClearedExpectation {
    pub id: DbId,
    pub due_at: Timestamp,
    pub severity: String,
}

/// Slim projection returned by the scheduler claim.
#[derive(Debug, Clone, FromRow)]
pub struct DueExpectation {
    pub id: DbId,
    pub workflow_run_id: DbId,
    pub from_node_key: String,
    pub to_node_key: String,
    pub due_at: Timestamp,
    pub severity: String,
}
