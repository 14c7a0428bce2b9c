//! Repository for the `stage_aggregate` table.

use sqlx::PgPool;
use sentinel_core::types::{DbId, Timestamp};

use crate::models::aggregate::{AggregateWindowQuery, StageAggregate};

/// Column list for `stage_aggregate` queries.
const COLUMNS: &str = "\
    id, workflow_version_id, group_dim_hash, node_key, bucket_start, \
    in_flight, completed, late, failed";

/// Maximum page size for aggregate listings.
const MAX_LIMIT: i64 = 1000;

/// Default page size for aggregate listings.
const DEFAULT_LIMIT: i64 = 200;

/// Provides the signed-delta upsert and window queries for stage counters.
pub struct StageAggregateRepo;

impl StageAggregateRepo {
    /// Apply signed deltas to one counter row, creating it when absent.
    ///
    /// A single atomic statement: counters are never read-modify-written
    /// from application code, so any number of concurrent callers targeting
    /// the same key commute. `in_flight` is clamped at 0 on both arms.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        pool: &PgPool,
        workflow_version_id: DbId,
        group_dim_hash: &str,
        node_key: &str,
        bucket_start: Timestamp,
        in_flight_delta: i32,
        completed_delta: i32,
        late_delta: i32,
        failed_delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO stage_aggregate \
                 (workflow_version_id, group_dim_hash, node_key, bucket_start, \
                  in_flight, completed, late, failed) \
             VALUES ($1, $2, $3, $4, GREATEST(0, $5), $6, $7, $8) \
             ON CONFLICT (workflow_version_id, group_dim_hash, node_key, bucket_start) \
             DO UPDATE SET \
                 in_flight = GREATEST(0, stage_aggregate.in_flight + $5), \
                 completed = stage_aggregate.completed + $6, \
                 late = stage_aggregate.late + $7, \
                 failed = stage_aggregate.failed + $8",
        )
        .bind(workflow_version_id)
        .bind(group_dim_hash)
        .bind(node_key)
        .bind(bucket_start)
        .bind(in_flight_delta)
        .bind(completed_delta)
        .bind(late_delta)
        .bind(failed_delta)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Aggregates for a workflow version, optionally filtered by group hash
    /// and bucket window, newest bucket first.
    pub async fn list_window(
        pool: &PgPool,
        workflow_version_id: DbId,
        params: &AggregateWindowQuery,
    ) -> Result<Vec<StageAggregate>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions = vec!["workflow_version_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if params.group_hash.is_some() {
            conditions.push(format!("group_dim_hash = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.from.is_some() {
            conditions.push(format!("bucket_start >= ${bind_idx}"));
            bind_idx += 1;
        }
        if params.to.is_some() {
            conditions.push(format!("bucket_start <= ${bind_idx}"));
            bind_idx += 1;
        }

        let query = format!(
            "SELECT {COLUMNS} FROM stage_aggregate \
             WHERE {} \
             ORDER BY bucket_start DESC \
             LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, StageAggregate>(&query).bind(workflow_version_id);
        if let Some(ref group_hash) = params.group_hash {
            q = q.bind(group_hash);
        }
        if let Some(from) = params.from {
            q = q.bind(from);
        }
        if let Some(to) = params.to {
            q = q.bind(to);
        }
        q.bind(limit).fetch_all(pool).await
    }
}
