//! Repository for the append-only `event_occurrence` table.

use sqlx::PgPool;
use sentinel_core::types::DbId;

use crate::models::run::{CreateOccurrence, EventOccurrence};

/// Column list for `event_occurrence` queries.
const COLUMNS: &str = "\
    id, workflow_run_id, node_key, event_id, event_time_utc, received_at, \
    payload_excerpt, is_late, is_duplicate, order_violation";

/// Provides append and dedup-probe operations for event occurrences.
pub struct OccurrenceRepo;

impl OccurrenceRepo {
    /// Append an occurrence to a run's log.
    pub async fn insert(
        pool: &PgPool,
        workflow_run_id: DbId,
        input: &CreateOccurrence,
    ) -> Result<EventOccurrence, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_occurrence \
                 (workflow_run_id, node_key, event_id, event_time_utc, received_at, \
                  payload_excerpt, is_late, is_duplicate, order_violation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventOccurrence>(&query)
            .bind(workflow_run_id)
            .bind(&input.node_key)
            .bind(&input.event_id)
            .bind(input.event_time_utc)
            .bind(input.received_at)
            .bind(&input.payload_excerpt)
            .bind(input.is_late)
            .bind(input.is_duplicate)
            .bind(input.order_violation)
            .fetch_one(pool)
            .await
    }

    /// Whether an event id was already applied to this run.
    ///
    /// The duplicate-detection key of the idempotency contract.
    pub async fn has_seen_event(
        pool: &PgPool,
        workflow_run_id: DbId,
        event_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM event_occurrence \
                 WHERE workflow_run_id = $1 AND event_id = $2)",
        )
        .bind(workflow_run_id)
        .bind(event_id)
        .fetch_one(pool)
        .await
    }

    /// A run's occurrences in arrival order.
    pub async fn list_for_run(
        pool: &PgPool,
        workflow_run_id: DbId,
    ) -> Result<Vec<EventOccurrence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM event_occurrence \
             WHERE workflow_run_id = $1 \
             ORDER BY received_at ASC, id ASC"
        );
        sqlx::query_as::<_, EventOccurrence>(&query)
            .bind(workflow_run_id)
            .fetch_all(pool)
            .await
    }
}
