//! Repository for the `expectation` table.
//!
//! Two operations here carry the core's concurrency contract: the arrival
//! clear and the scheduler claim are each a single atomic statement, so an
//! expectation is consumed exactly once even with concurrent workers and
//! multiple scheduler instances.

use sqlx::PgPool;
use sentinel_core::types::{DbId, Timestamp};

use crate::models::expectation::{ClearedExpectation, DueExpectation, Expectation};

/// Column list for `expectation` queries.
const COLUMNS: &str = "\
    id, workflow_run_id, from_node_key, to_node_key, due_at, severity, \
    status, lock_owner, fired_at, created_at";

/// Provides lifecycle operations for expectations.
pub struct ExpectationRepo;

impl ExpectationRepo {
    /// Insert `count` identical pending expectations.
    ///
    /// An edge with `expected_count = N` yields N rows, one per expected
    /// occurrence. Returns the number of rows inserted.
    pub async fn create_many(
        pool: &PgPool,
        workflow_run_id: DbId,
        from_node_key: &str,
        to_node_key: &str,
        due_at: Timestamp,
        severity: &str,
        count: i32,
    ) -> Result<u64, sqlx::Error> {
        if count < 1 {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO expectation \
                 (workflow_run_id, from_node_key, to_node_key, due_at, severity, status) \
             SELECT $1, $2, $3, $4, $5, 'pending' \
             FROM generate_series(1, $6)",
        )
        .bind(workflow_run_id)
        .bind(from_node_key)
        .bind(to_node_key)
        .bind(due_at)
        .bind(severity)
        .bind(count)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear all open expectations targeting `to_node_key` on a run.
    ///
    /// Both `pending` and `fired` rows are cleared in one statement; the
    /// returned projections carry what the caller needs for lateness and
    /// severity derivation.
    pub async fn clear_for_arrival(
        pool: &PgPool,
        workflow_run_id: DbId,
        to_node_key: &str,
    ) -> Result<Vec<ClearedExpectation>, sqlx::Error> {
        sqlx::query_as::<_, ClearedExpectation>(
            "UPDATE expectation \
             SET status = 'cleared', lock_owner = NULL \
             WHERE workflow_run_id = $1 AND to_node_key = $2 \
               AND status IN ('pending', 'fired') \
             RETURNING id, due_at, severity",
        )
        .bind(workflow_run_id)
        .bind(to_node_key)
        .fetch_all(pool)
        .await
    }

    /// Atomically claim up to `limit` due pending expectations for `owner`.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent scheduler instances never
    /// claim the same row; rows cleared by a racing arrival are excluded by
    /// the `pending`-only predicate.
    pub async fn claim_due_pending(
        pool: &PgPool,
        limit: i64,
        owner: &str,
    ) -> Result<Vec<DueExpectation>, sqlx::Error> {
        sqlx::query_as::<_, DueExpectation>(
            "UPDATE expectation \
             SET status = 'fired', lock_owner = $1, fired_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM expectation \
                 WHERE status = 'pending' AND due_at <= NOW() \
                 ORDER BY due_at ASC \
                 LIMIT $2 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, workflow_run_id, from_node_key, to_node_key, due_at, severity",
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// A run's pending expectations ordered by due time.
    pub async fn list_pending_for_run(
        pool: &PgPool,
        workflow_run_id: DbId,
    ) -> Result<Vec<Expectation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM expectation \
             WHERE workflow_run_id = $1 AND status = 'pending' \
             ORDER BY due_at ASC"
        );
        sqlx::query_as::<_, Expectation>(&query)
            .bind(workflow_run_id)
            .fetch_all(pool)
            .await
    }

    /// Find an expectation by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Expectation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM expectation WHERE id = $1");
        sqlx::query_as::<_, Expectation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
