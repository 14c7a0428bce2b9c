//! Repository for the append-only `audit_log` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLogEntry, CreateAuditEntry};

/// Column list for `audit_log` queries.
const COLUMNS: &str = "id, entity_type, entity_id, action, actor, details, created_at";

/// Provides append and query operations for audit entries.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append a single audit entry.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateAuditEntry,
    ) -> Result<AuditLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_log (entity_type, entity_id, action, actor, details) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(&input.entity_type)
            .bind(&input.entity_id)
            .bind(&input.action)
            .bind(&input.actor)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Audit entries for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_log \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
