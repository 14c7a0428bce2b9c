//! Alert manager: deduplicated trigger intake and lifecycle operations.

use serde_json::json;

use sentinel_core::alerting::AlertState;
use sentinel_core::types::{DbId, Timestamp};
use sentinel_core::CoreError;
use sentinel_db::models::alert::{Alert, UpsertAlert};
use sentinel_db::models::audit::CreateAuditEntry;
use sentinel_db::repositories::{AlertRepo, AuditLogRepo};
use sentinel_db::DbPool;
use sentinel_events::AlertTrigger;

use crate::error::{EngineError, EngineResult};

/// Fallback node key for triggers that somehow arrive without one.
const UNKNOWN_NODE: &str = "unknown";

/// Maintains alert state: dedup, lifecycle, audit.
pub struct AlertManager {
    pool: DbPool,
}

impl AlertManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Idempotent trigger intake keyed by the trigger's dedupe key.
    ///
    /// New keys open an alert; existing ones refresh severity and
    /// `last_triggered_at`, reopening only from `resolved`.
    pub async fn handle_trigger(&self, trigger: &AlertTrigger) -> Result<Alert, sqlx::Error> {
        let node_key = if trigger.node.is_empty() {
            UNKNOWN_NODE.to_string()
        } else {
            trigger.node.clone()
        };
        let input = UpsertAlert {
            correlation_key: trigger.correlation_key.clone(),
            workflow_version_id: trigger.workflow_version_id,
            node_key,
            severity: trigger.severity.as_str().to_string(),
            dedupe_key: trigger.dedupe_key.clone(),
            triggered_at: trigger.triggered_at,
        };
        AlertRepo::upsert_trigger(&self.pool, &input).await
    }

    /// Acknowledge an alert.
    pub async fn ack(&self, id: DbId, actor: &str, reason: &str) -> EngineResult<Alert> {
        self.set_state(id, AlertState::Ack, actor, reason, None).await
    }

    /// Suppress an alert until the given instant.
    pub async fn suppress(
        &self,
        id: DbId,
        actor: &str,
        reason: &str,
        until: Timestamp,
    ) -> EngineResult<Alert> {
        self.set_state(id, AlertState::Suppressed, actor, reason, Some(until))
            .await
    }

    /// Resolve an alert. A later trigger on the same dedupe key reopens it.
    pub async fn resolve(&self, id: DbId, actor: &str, reason: &str) -> EngineResult<Alert> {
        self.set_state(id, AlertState::Resolved, actor, reason, None)
            .await
    }

    /// Fetch an alert by id.
    pub async fn get(&self, id: DbId) -> EngineResult<Alert> {
        AlertRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| EngineError::Core(CoreError::NotFound { entity: "alert", id }))
    }

    /// List alerts, optionally filtered by state, most recent first.
    pub async fn list(
        &self,
        state: Option<AlertState>,
        limit: i64,
    ) -> Result<Vec<Alert>, sqlx::Error> {
        AlertRepo::list(&self.pool, state.map(|s| s.as_str()), limit).await
    }

    /// Shared lifecycle transition: idempotent state write plus one audit
    /// entry. Unknown ids surface as `NotFound`.
    async fn set_state(
        &self,
        id: DbId,
        state: AlertState,
        actor: &str,
        reason: &str,
        suppressed_until: Option<Timestamp>,
    ) -> EngineResult<Alert> {
        let alert = AlertRepo::set_state(&self.pool, id, state.as_str(), actor, suppressed_until)
            .await?
            .ok_or(CoreError::NotFound { entity: "alert", id })?;

        let mut details = json!({ "reason": reason });
        if let Some(until) = suppressed_until {
            details["until"] = json!(until);
        }
        AuditLogRepo::insert(
            &self.pool,
            &CreateAuditEntry {
                entity_type: "alert".to_string(),
                entity_id: id.to_string(),
                action: state.as_str().to_string(),
                actor: Some(actor.to_string()),
                details: Some(details),
            },
        )
        .await?;

        Ok(alert)
    }
}
