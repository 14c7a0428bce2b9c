//! Repository for the `workflow_run` table.

use serde_json::Value;
use sqlx::PgPool;
use sentinel_core::types::{DbId, Timestamp};

use crate::models::run::WorkflowRun;

/// Column list for `workflow_run` queries.
const COLUMNS: &str = "\
    id, workflow_version_id, correlation_key, group_dims, status, \
    last_node_key, started_at, updated_at";

/// Maximum page size for run listings.
const MAX_LIMIT: i64 = 200;

/// Provides state operations for workflow runs.
pub struct RunRepo;

impl RunRepo {
    /// Find the run for `(workflow_version_id, correlation_key)`, creating
    /// it when absent. Returns the run and whether it was created.
    ///
    /// The insert uses `ON CONFLICT DO NOTHING` against the unique pair
    /// constraint, so concurrent callers converge on a single row.
    pub async fn find_or_create(
        pool: &PgPool,
        workflow_version_id: DbId,
        correlation_key: &str,
        group_dims: &Value,
        started_at: Timestamp,
    ) -> Result<(WorkflowRun, bool), sqlx::Error> {
        let insert = format!(
            "INSERT INTO workflow_run \
                 (workflow_version_id, correlation_key, group_dims, status, started_at, updated_at) \
             VALUES ($1, $2, $3, 'green', $4, $4) \
             ON CONFLICT (workflow_version_id, correlation_key) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, WorkflowRun>(&insert)
            .bind(workflow_version_id)
            .bind(correlation_key)
            .bind(group_dims)
            .bind(started_at)
            .fetch_optional(pool)
            .await?;

        if let Some(run) = created {
            return Ok((run, true));
        }

        let select = format!(
            "SELECT {COLUMNS} FROM workflow_run \
             WHERE workflow_version_id = $1 AND correlation_key = $2"
        );
        let run = sqlx::query_as::<_, WorkflowRun>(&select)
            .bind(workflow_version_id)
            .bind(correlation_key)
            .fetch_one(pool)
            .await?;
        Ok((run, false))
    }

    /// Update the run's cached status and last node; stamps `updated_at`.
    pub async fn update_status(
        pool: &PgPool,
        run_id: DbId,
        status: &str,
        last_node_key: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE workflow_run \
             SET status = $2, last_node_key = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(run_id)
        .bind(status)
        .bind(last_node_key)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a run by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkflowRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflow_run WHERE id = $1");
        sqlx::query_as::<_, WorkflowRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All runs for a correlation key, optionally restricted to one version.
    pub async fn list_by_correlation(
        pool: &PgPool,
        correlation_key: &str,
        workflow_version_id: Option<DbId>,
    ) -> Result<Vec<WorkflowRun>, sqlx::Error> {
        match workflow_version_id {
            Some(version_id) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM workflow_run \
                     WHERE correlation_key = $1 AND workflow_version_id = $2 \
                     ORDER BY started_at ASC"
                );
                sqlx::query_as::<_, WorkflowRun>(&query)
                    .bind(correlation_key)
                    .bind(version_id)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM workflow_run \
                     WHERE correlation_key = $1 \
                     ORDER BY started_at ASC"
                );
                sqlx::query_as::<_, WorkflowRun>(&query)
                    .bind(correlation_key)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Most recently updated runs for a workflow version.
    pub async fn list_recent(
        pool: &PgPool,
        workflow_version_id: DbId,
        limit: i64,
    ) -> Result<Vec<WorkflowRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_run \
             WHERE workflow_version_id = $1 \
             ORDER BY updated_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, WorkflowRun>(&query)
            .bind(workflow_version_id)
            .bind(limit.min(MAX_LIMIT))
            .fetch_all(pool)
            .await
    }
}
