//! Expectation scheduler: periodic claim of overdue expectations.
//!
//! Runs as a long-lived background task spawned by the worker binary. Each
//! tick atomically claims one bounded batch of due pending expectations and
//! feeds every claimed row into the engine's synthetic-miss path. Rows are
//! processed independently; a failing row never blocks the rest of the
//! batch, and concurrent scheduler instances never claim the same row.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use sentinel_core::alerting::expectation_dedupe_key;
use sentinel_db::repositories::ExpectationRepo;
use sentinel_db::DbPool;
use sentinel_events::SyntheticMissed;

use crate::config::EngineConfig;
use crate::engine::RuleEngine;

/// Drives the expectation store's claim operation on a fixed interval.
pub struct ExpectationScheduler {
    pool: DbPool,
    engine: Arc<RuleEngine>,
    config: EngineConfig,
    /// Claim lock owner, unique per scheduler instance.
    owner: String,
}

impl ExpectationScheduler {
    pub fn new(pool: DbPool, engine: Arc<RuleEngine>, config: EngineConfig) -> Self {
        Self {
            pool,
            engine,
            config,
            owner: format!("scheduler-{}", Uuid::now_v7()),
        }
    }

    /// Run the poll loop until `cancel` is triggered.
    ///
    /// A disabled scheduler returns immediately without ever polling;
    /// event-driven processing is unaffected.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.scheduler_enabled {
            tracing::info!("Expectation scheduler disabled, not polling");
            return;
        }

        tracing::info!(
            interval_secs = self.config.scheduler_interval_secs,
            poll_limit = self.config.scheduler_poll_limit,
            owner = %self.owner,
            "Expectation scheduler started"
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.scheduler_interval_secs));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expectation scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(claimed) if claimed > 0 => {
                            tracing::info!(claimed, "Processed due expectations");
                        }
                        Ok(_) => {
                            tracing::debug!("No due expectations");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Expectation poll failed");
                        }
                    }
                }
            }
        }
    }

    /// Claim one batch of due expectations and feed each into the engine.
    ///
    /// Returns the number of rows claimed. Exposed separately from the loop
    /// so tests can drive a tick deterministically.
    pub async fn poll_once(&self) -> Result<usize, sqlx::Error> {
        let due = ExpectationRepo::claim_due_pending(
            &self.pool,
            self.config.scheduler_poll_limit,
            &self.owner,
        )
        .await?;
        if due.is_empty() {
            return Ok(0);
        }
        tracing::info!(claimed = due.len(), "Claimed due expectations for synthetic emission");

        for row in &due {
            let missed = SyntheticMissed {
                expectation_id: row.id,
                workflow_run_id: row.workflow_run_id,
                from_node: row.from_node_key.clone(),
                to_node: row.to_node_key.clone(),
                due_at: row.due_at,
                severity: row.severity.clone(),
                dedupe_key: expectation_dedupe_key(row.id, row.due_at),
            };
            // Per-row isolation: the engine logs and swallows failures.
            self.engine.handle_synthetic_missed(&missed).await;
        }
        Ok(due.len())
    }
}
