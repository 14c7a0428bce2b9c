//! Read-only accessor over the workflow configuration tables.
//!
//! This is the engine's view of the Workflow Config Accessor: resolve a
//! workflow key (or an event type, for fan-out) to active versions and load
//! a version's stage-graph parts. Authoring lives outside this core.

use sqlx::PgPool;
use sentinel_core::types::DbId;

use crate::models::workflow::{Workflow, WorkflowEdgeRow, WorkflowNodeRow, WorkflowVersion};

/// Column list for `workflow` queries.
const WORKFLOW_COLUMNS: &str = "id, key, name, owner, active_version_id, created_at";

/// Column list for `workflow_version` queries.
const VERSION_COLUMNS: &str = "\
    id, workflow_id, version_num, status, created_by, created_at, published_at";

/// Column list for `workflow_version` queries joined under alias `v`.
const VERSION_COLUMNS_QUALIFIED: &str = "\
    v.id, v.workflow_id, v.version_num, v.status, v.created_by, v.created_at, v.published_at";

/// Column list for `workflow_node` queries.
const NODE_COLUMNS: &str = "\
    id, workflow_version_id, node_key, event_type, is_start, is_terminal";

/// Provides read operations over workflow definitions and their graphs.
pub struct WorkflowConfigRepo;

impl WorkflowConfigRepo {
    /// Find a workflow definition by its external key.
    pub async fn find_workflow_by_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!("SELECT {WORKFLOW_COLUMNS} FROM workflow WHERE key = $1");
        sqlx::query_as::<_, Workflow>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Resolve the active version for a workflow key.
    ///
    /// Uses the workflow's `active_version_id` when set, otherwise falls
    /// back to the highest `version_num`.
    pub async fn active_version_for_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<WorkflowVersion>, sqlx::Error> {
        let Some(workflow) = Self::find_workflow_by_key(pool, key).await? else {
            return Ok(None);
        };

        if let Some(version_id) = workflow.active_version_id {
            let query = format!("SELECT {VERSION_COLUMNS} FROM workflow_version WHERE id = $1");
            return sqlx::query_as::<_, WorkflowVersion>(&query)
                .bind(version_id)
                .fetch_optional(pool)
                .await;
        }

        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM workflow_version \
             WHERE workflow_id = $1 \
             ORDER BY version_num DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkflowVersion>(&query)
            .bind(workflow.id)
            .fetch_optional(pool)
            .await
    }

    /// Fan-out resolution: all active versions whose graph contains a node
    /// with the given event type.
    pub async fn active_versions_for_event_type(
        pool: &PgPool,
        event_type: &str,
    ) -> Result<Vec<WorkflowVersion>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT {VERSION_COLUMNS_QUALIFIED} FROM workflow_version v \
             JOIN workflow w ON w.active_version_id = v.id \
             JOIN workflow_node n ON n.workflow_version_id = v.id \
             WHERE n.event_type = $1"
        );
        sqlx::query_as::<_, WorkflowVersion>(&query)
            .bind(event_type)
            .fetch_all(pool)
            .await
    }

    /// Load the node and edge rows making up a version's stage graph.
    ///
    /// Edges come back joined with their endpoint node keys.
    pub async fn load_graph_parts(
        pool: &PgPool,
        workflow_version_id: DbId,
    ) -> Result<(Vec<WorkflowNodeRow>, Vec<WorkflowEdgeRow>), sqlx::Error> {
        let node_query = format!(
            "SELECT {NODE_COLUMNS} FROM workflow_node WHERE workflow_version_id = $1"
        );
        let nodes = sqlx::query_as::<_, WorkflowNodeRow>(&node_query)
            .bind(workflow_version_id)
            .fetch_all(pool)
            .await?;

        let edges = sqlx::query_as::<_, WorkflowEdgeRow>(
            "SELECT nf.node_key AS from_node_key, nt.node_key AS to_node_key, \
                    e.max_latency_sec, e.absolute_deadline, e.optional, \
                    e.expected_count, e.severity \
             FROM workflow_edge e \
             JOIN workflow_node nf ON nf.id = e.from_node_id \
             JOIN workflow_node nt ON nt.id = e.to_node_id \
             WHERE nf.workflow_version_id = $1",
        )
        .bind(workflow_version_id)
        .fetch_all(pool)
        .await?;

        Ok((nodes, edges))
    }
}
