//! Audit log entity models. Entries are immutable once created.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sentinel_core::types::{DbId, Timestamp};

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: Option<String>,
    pub details: Option<serde_json::Value>,
}
