//! Alert entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sentinel_core::types::{DbId, Timestamp};

/// A row from the `alert` table, identified by its dedupe key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub correlation_key: String,
    pub workflow_version_id: DbId,
    pub node_key: String,
    pub severity: String,
    pub state: String,
    pub dedupe_key: String,
    pub first_triggered_at: Timestamp,
    pub last_triggered_at: Option<Timestamp>,
    pub acked_by: Option<String>,
    pub acked_at: Option<Timestamp>,
    pub suppressed_until: Option<Timestamp>,
}

/// DTO for the idempotent trigger upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAlert {
    pub correlation_key: String,
    pub workflow_version_id: DbId,
    pub node_key: String,
    pub severity: String,
    pub dedupe_key: String,
    pub triggered_at: Timestamp,
}
