//! Event correlation engine.
//!
//! Maps normalized events onto workflow-run state: resolves target versions,
//! clears and creates expectations, detects lateness and order violations,
//! appends the occurrence log, projects the run status, and emits the two
//! outcome contracts: synchronously into the Stage Aggregator and Alert
//! Manager, and onto the [`OutcomeBus`] for external consumers.
//!
//! A failure while processing one target never aborts the other targets of
//! the same event; idempotency is carried by the duplicate-event check, not
//! by transactional rollback across steps.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use sentinel_core::alerting::{reasons, rule_dedupe_key};
use sentinel_core::deadline::compute_due_at;
use sentinel_core::graph::StageGraph;
use sentinel_core::group;
use sentinel_core::projection::{alert_severity, derive_status};
use sentinel_core::types::DbId;
use sentinel_core::{CoreError, Severity};
use sentinel_db::models::run::CreateOccurrence;
use sentinel_db::models::workflow::WorkflowVersion;
use sentinel_db::repositories::{ExpectationRepo, OccurrenceRepo, RunRepo, WorkflowConfigRepo};
use sentinel_db::DbPool;
use sentinel_events::{AlertTrigger, NormalizedEvent, OutcomeBus, RuleEvaluated, SyntheticMissed};

use crate::aggregator::StageAggregator;
use crate::alerts::AlertManager;
use crate::error::EngineError;

/// Longest payload excerpt persisted on an occurrence.
const PAYLOAD_EXCERPT_MAX: usize = 500;

/// Correlates events against workflow-run state and emits outcomes.
pub struct RuleEngine {
    pool: DbPool,
    bus: Arc<OutcomeBus>,
    aggregator: StageAggregator,
    alerts: AlertManager,
}

impl RuleEngine {
    pub fn new(pool: DbPool, bus: Arc<OutcomeBus>) -> Self {
        Self {
            aggregator: StageAggregator::new(pool.clone()),
            alerts: AlertManager::new(pool.clone()),
            pool,
            bus,
        }
    }

    /// The alert manager this engine dispatches into.
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    /// Primary entry point for normalized events.
    ///
    /// Resolves applicable workflow versions and processes the event against
    /// each. No resolvable target means the event is dropped with a log
    /// line, never an error.
    pub async fn handle_normalized_event(&self, event: &NormalizedEvent) {
        let targets = match self.resolve_target_versions(event).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    correlation_key = %event.correlation_key,
                    "Failed to resolve target versions"
                );
                return;
            }
        };
        if targets.is_empty() {
            tracing::debug!(
                event_type = %event.event_type,
                correlation_key = %event.correlation_key,
                "No workflow versions resolved for event"
            );
            return;
        }
        tracing::info!(
            correlation_key = %event.correlation_key,
            event_type = %event.event_type,
            targets = targets.len(),
            "Processing normalized event"
        );
        for version in &targets {
            if let Err(e) = self.process_for_version(event, version).await {
                tracing::error!(
                    error = %e,
                    workflow_version_id = version.id,
                    correlation_key = %event.correlation_key,
                    "Failed to process event for version"
                );
            }
        }
    }

    /// Secondary entry point for scheduler-produced synthetic misses.
    ///
    /// All failures are caught and logged; one bad row must never block the
    /// rest of a claimed batch.
    pub async fn handle_synthetic_missed(&self, missed: &SyntheticMissed) {
        tracing::info!(
            run_id = missed.workflow_run_id,
            to_node = %missed.to_node,
            severity = %missed.severity,
            "Handling synthetic miss"
        );
        if let Err(e) = self.apply_synthetic_missed(missed).await {
            tracing::error!(
                error = %e,
                expectation_id = missed.expectation_id,
                run_id = missed.workflow_run_id,
                "Failed to handle synthetic miss"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Target resolution
    // -----------------------------------------------------------------------

    /// Resolve the workflow versions an event applies to.
    ///
    /// Explicit `workflow_keys`/`workflow_key` win; otherwise every active
    /// version containing a node for the event type is targeted (fan-out).
    /// Deduplicated by version id.
    async fn resolve_target_versions(
        &self,
        event: &NormalizedEvent,
    ) -> Result<Vec<WorkflowVersion>, sqlx::Error> {
        let mut targets: Vec<WorkflowVersion> = Vec::new();

        let explicit_keys: Vec<&str> = match (&event.workflow_keys, &event.workflow_key) {
            (Some(keys), _) if !keys.is_empty() => keys.iter().map(String::as_str).collect(),
            (_, Some(key)) if !key.is_empty() => vec![key.as_str()],
            _ => Vec::new(),
        };

        if explicit_keys.is_empty() {
            let versions =
                WorkflowConfigRepo::active_versions_for_event_type(&self.pool, &event.event_type)
                    .await?;
            for version in versions {
                add_if_new(&mut targets, version);
            }
        } else {
            for key in explicit_keys {
                if let Some(version) =
                    WorkflowConfigRepo::active_version_for_key(&self.pool, key).await?
                {
                    add_if_new(&mut targets, version);
                }
            }
        }
        Ok(targets)
    }

    // -----------------------------------------------------------------------
    // Per-target processing
    // -----------------------------------------------------------------------

    async fn process_for_version(
        &self,
        event: &NormalizedEvent,
        version: &WorkflowVersion,
    ) -> Result<(), EngineError> {
        let graph = self.load_graph(version.id).await?;
        let Some(node) = graph.node_for_event(&event.event_type) else {
            tracing::warn!(
                event_type = %event.event_type,
                workflow_version_id = version.id,
                correlation_key = %event.correlation_key,
                "No node matches event type, skipping target"
            );
            return Ok(());
        };

        let (run, created) = RunRepo::find_or_create(
            &self.pool,
            version.id,
            &event.correlation_key,
            &event.group,
            event.event_time,
        )
        .await?;
        if created {
            tracing::info!(
                workflow_version_id = version.id,
                run_id = run.id,
                correlation_key = %event.correlation_key,
                start_node = %node.node_key,
                "Created new workflow run"
            );
        }

        if let Some(event_id) = event.event_id.as_deref().filter(|id| !id.is_empty()) {
            if OccurrenceRepo::has_seen_event(&self.pool, run.id, event_id).await? {
                tracing::info!(
                    correlation_key = %event.correlation_key,
                    event_id,
                    workflow_version_id = version.id,
                    "Duplicate event ignored"
                );
                return Ok(());
            }
        }

        let cleared = ExpectationRepo::clear_for_arrival(&self.pool, run.id, &node.node_key).await?;
        let late = cleared.iter().any(|c| event.received_at > c.due_at);
        let order_violation =
            cleared.is_empty() && !node.is_start && !graph.has_optional_inbound(&node.node_key);

        let mut in_flight_deltas: HashMap<String, i32> = HashMap::new();
        if !cleared.is_empty() {
            *in_flight_deltas.entry(node.node_key.clone()).or_insert(0) -= cleared.len() as i32;
            tracing::info!(
                run_id = run.id,
                node = %node.node_key,
                cleared = cleared.len(),
                late,
                "Cleared expectations"
            );
        }

        for edge in graph.outgoing_edges(&node.node_key) {
            if edge.optional {
                continue;
            }
            let due_at = compute_due_at(event.event_time, edge);
            let inserted = ExpectationRepo::create_many(
                &self.pool,
                run.id,
                &node.node_key,
                &edge.to_node,
                due_at,
                edge.severity.as_str(),
                edge.expected_count,
            )
            .await?;
            *in_flight_deltas.entry(edge.to_node.clone()).or_insert(0) += inserted as i32;
            tracing::debug!(
                run_id = run.id,
                from_node = %node.node_key,
                to_node = %edge.to_node,
                due_at = %due_at,
                severity = %edge.severity,
                "Created expectations"
            );
        }

        OccurrenceRepo::insert(
            &self.pool,
            run.id,
            &CreateOccurrence {
                node_key: node.node_key.clone(),
                event_id: event.event_id.clone(),
                event_time_utc: event.event_time,
                received_at: event.received_at,
                payload_excerpt: payload_excerpt(&event.payload),
                is_late: late,
                is_duplicate: false,
                order_violation,
            },
        )
        .await?;

        let cleared_severities: Vec<Severity> = cleared
            .iter()
            .map(|c| Severity::normalize(Some(&c.severity)))
            .collect();
        let status = derive_status(late, order_violation, &cleared_severities);
        RunRepo::update_status(&self.pool, run.id, status.as_str(), &node.node_key).await?;
        tracing::info!(
            run_id = run.id,
            workflow_version_id = version.id,
            node = %node.node_key,
            status = %status,
            late,
            order_violation,
            "Rule evaluated"
        );

        let evaluated = RuleEvaluated {
            workflow_version_id: version.id,
            workflow_run_id: run.id,
            node: node.node_key.clone(),
            correlation_key: event.correlation_key.clone(),
            status,
            late,
            order_violation,
            completed_delta: 1,
            late_delta: i32::from(late),
            failed_delta: i32::from(order_violation),
            in_flight_deltas,
            group: event.group.clone(),
            group_hash: group::hash(&event.group),
            event_time: event.event_time,
            received_at: event.received_at,
        };
        self.dispatch_rule_evaluated(evaluated).await;

        if late || order_violation {
            let reason = if order_violation {
                reasons::ORDER_VIOLATION
            } else {
                reasons::SLA_MISSED
            };
            let trigger = AlertTrigger {
                dedupe_key: rule_dedupe_key(version.id, &node.node_key, &event.correlation_key),
                workflow_version_id: version.id,
                workflow_run_id: Some(run.id),
                node: node.node_key.clone(),
                correlation_key: event.correlation_key.clone(),
                severity: alert_severity(order_violation, &cleared_severities),
                reason: reason.to_string(),
                triggered_at: event.received_at,
            };
            self.dispatch_alert_trigger(trigger).await;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Synthetic misses
    // -----------------------------------------------------------------------

    async fn apply_synthetic_missed(&self, missed: &SyntheticMissed) -> Result<(), EngineError> {
        let run = RunRepo::find_by_id(&self.pool, missed.workflow_run_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "workflow_run",
                id: missed.workflow_run_id,
            })?;
        let group_dims = run.group_dims.clone().unwrap_or(Value::Null);
        let severity = Severity::normalize(Some(&missed.severity));
        let now = Utc::now();

        let evaluated = RuleEvaluated {
            workflow_version_id: run.workflow_version_id,
            workflow_run_id: run.id,
            node: missed.to_node.clone(),
            correlation_key: run.correlation_key.clone(),
            status: severity,
            late: true,
            order_violation: false,
            completed_delta: 0,
            late_delta: 1,
            failed_delta: 0,
            in_flight_deltas: HashMap::new(),
            group: group_dims.clone(),
            group_hash: group::hash(&group_dims),
            event_time: missed.due_at,
            received_at: now,
        };
        self.dispatch_rule_evaluated(evaluated).await;

        RunRepo::update_status(&self.pool, run.id, severity.as_str(), &missed.to_node).await?;

        let trigger = AlertTrigger {
            // The expectation-scoped key: a missed expectation and a
            // late-but-arrived event on the same node are distinct
            // alertable conditions.
            dedupe_key: missed.dedupe_key.clone(),
            workflow_version_id: run.workflow_version_id,
            workflow_run_id: Some(run.id),
            node: missed.to_node.clone(),
            correlation_key: run.correlation_key.clone(),
            severity,
            reason: reasons::EXPECTED_MISSED.to_string(),
            triggered_at: now,
        };
        self.dispatch_alert_trigger(trigger).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Apply an outcome to the aggregator, then publish it.
    ///
    /// Aggregation failures are logged and do not fail the event; the upsert
    /// is idempotent under replay.
    async fn dispatch_rule_evaluated(&self, outcome: RuleEvaluated) {
        if let Err(e) = self.aggregator.apply(&outcome).await {
            tracing::warn!(
                error = %e,
                run_id = outcome.workflow_run_id,
                "Failed to aggregate rule-evaluated outcome"
            );
        }
        self.bus.publish_rule_evaluated(outcome);
    }

    /// Apply a trigger to the alert manager, then publish it.
    async fn dispatch_alert_trigger(&self, trigger: AlertTrigger) {
        if let Err(e) = self.alerts.handle_trigger(&trigger).await {
            tracing::error!(
                error = %e,
                dedupe_key = %trigger.dedupe_key,
                "Failed to apply alert trigger"
            );
        }
        self.bus.publish_alert_trigger(trigger);
    }

    /// Load and validate the stage graph of a workflow version.
    async fn load_graph(&self, workflow_version_id: DbId) -> Result<StageGraph, EngineError> {
        let (nodes, edges) =
            WorkflowConfigRepo::load_graph_parts(&self.pool, workflow_version_id).await?;
        let graph = StageGraph::new(
            nodes.into_iter().map(|n| n.into_def()).collect(),
            edges.into_iter().map(|e| e.into_def()).collect(),
        )?;
        Ok(graph)
    }
}

/// Append a version if its id is not already targeted.
fn add_if_new(targets: &mut Vec<WorkflowVersion>, version: WorkflowVersion) {
    if !targets.iter().any(|v| v.id == version.id) {
        targets.push(version);
    }
}

/// Serialize a payload for traceability, truncated to a bounded excerpt.
///
/// Serialization failure drops the excerpt for this one occurrence, never
/// the occurrence itself.
fn payload_excerpt(payload: &Value) -> Option<String> {
    if payload.is_null() {
        return None;
    }
    match serde_json::to_string(payload) {
        Ok(mut json) => {
            if json.len() > PAYLOAD_EXCERPT_MAX {
                // Truncate on a char boundary.
                let mut cut = PAYLOAD_EXCERPT_MAX;
                while !json.is_char_boundary(cut) {
                    cut -= 1;
                }
                json.truncate(cut);
            }
            Some(json)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize payload excerpt");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_payload_has_no_excerpt() {
        assert_eq!(payload_excerpt(&Value::Null), None);
    }

    #[test]
    fn short_payload_is_kept_verbatim() {
        let excerpt = payload_excerpt(&json!({"qty": 3})).unwrap();
        assert_eq!(excerpt, r#"{"qty":3}"#);
    }

    #[test]
    fn long_payload_is_truncated() {
        let excerpt = payload_excerpt(&json!({"blob": "x".repeat(2000)})).unwrap();
        assert_eq!(excerpt.len(), PAYLOAD_EXCERPT_MAX);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let excerpt = payload_excerpt(&json!({"blob": "é".repeat(2000)})).unwrap();
        assert!(excerpt.len() <= PAYLOAD_EXCERPT_MAX);
        // Would panic during truncation if a boundary were split.
    }
}
