//! Repository for the `alert` table.

use sqlx::PgPool;
use sentinel_core::types::{DbId, Timestamp};

use crate::models::alert::{Alert, UpsertAlert};

/// Column list for `alert` queries.
const COLUMNS: &str = "\
    id, correlation_key, workflow_version_id, node_key, severity, state, \
    dedupe_key, first_triggered_at, last_triggered_at, acked_by, acked_at, \
    suppressed_until";

/// Maximum page size for alert listings.
const MAX_LIMIT: i64 = 500;

/// Provides trigger-intake and lifecycle operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Idempotent trigger intake keyed by `dedupe_key`.
    ///
    /// Creates an `open` alert when the key is new; otherwise refreshes
    /// `severity`/`last_triggered_at` and reopens only from `resolved`.
    /// `ack` and `suppressed` states survive repeated triggers. One atomic
    /// statement, safe under concurrent triggers for the same key.
    pub async fn upsert_trigger(
        pool: &PgPool,
        input: &UpsertAlert,
    ) -> Result<Alert, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert \
                 (correlation_key, workflow_version_id, node_key, severity, state, \
                  dedupe_key, first_triggered_at, last_triggered_at) \
             VALUES ($1, $2, $3, $4, 'open', $5, $6, $6) \
             ON CONFLICT (dedupe_key) DO UPDATE SET \
                 severity = EXCLUDED.severity, \
                 last_triggered_at = EXCLUDED.last_triggered_at, \
                 state = CASE WHEN alert.state = 'resolved' THEN 'open' ELSE alert.state END \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(&input.correlation_key)
            .bind(input.workflow_version_id)
            .bind(&input.node_key)
            .bind(&input.severity)
            .bind(&input.dedupe_key)
            .bind(input.triggered_at)
            .fetch_one(pool)
            .await
    }

    /// Set an alert's lifecycle state, recording the actor.
    ///
    /// Backfills `last_triggered_at` when null. Returns `None` when the id
    /// is unknown. Idempotent; concurrent calls are last-writer-wins.
    pub async fn set_state(
        pool: &PgPool,
        id: DbId,
        state: &str,
        actor: &str,
        suppressed_until: Option<Timestamp>,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "UPDATE alert \
             SET state = $2, acked_by = $3, acked_at = NOW(), suppressed_until = $4, \
                 last_triggered_at = COALESCE(last_triggered_at, NOW()) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(state)
            .bind(actor)
            .bind(suppressed_until)
            .fetch_optional(pool)
            .await
    }

    /// Find an alert by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alert WHERE id = $1");
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List alerts, optionally filtered by state, most recent first.
    pub async fn list(
        pool: &PgPool,
        state: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Alert>, sqlx::Error> {
        let limit = limit.min(MAX_LIMIT);
        match state {
            Some(state) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM alert \
                     WHERE state = $1 \
                     ORDER BY last_triggered_at DESC \
                     LIMIT $2"
                );
                sqlx::query_as::<_, Alert>(&query)
                    .bind(state)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM alert \
                     ORDER BY last_triggered_at DESC \
                     LIMIT $1"
                );
                sqlx::query_as::<_, Alert>(&query)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// All alerts for a correlation key, optionally restricted to a version.
    pub async fn list_for_correlation(
        pool: &PgPool,
        correlation_key: &str,
        workflow_version_id: Option<DbId>,
    ) -> Result<Vec<Alert>, sqlx::Error> {
        match workflow_version_id {
            Some(version_id) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM alert \
                     WHERE correlation_key = $1 AND workflow_version_id = $2 \
                     ORDER BY last_triggered_at DESC"
                );
                sqlx::query_as::<_, Alert>(&query)
                    .bind(correlation_key)
                    .bind(version_id)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM alert \
                     WHERE correlation_key = $1 \
                     ORDER BY last_triggered_at DESC"
                );
                sqlx::query_as::<_, Alert>(&query)
                    .bind(correlation_key)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
