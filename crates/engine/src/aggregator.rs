//! Stage aggregator: minute-bucketed counter projection of outcomes.

use sentinel_core::time::minute_bucket;
use sentinel_db::repositories::StageAggregateRepo;
use sentinel_db::DbPool;
use sentinel_events::RuleEvaluated;

/// Projects rule-evaluated outcomes into `stage_aggregate` counters.
pub struct StageAggregator {
    pool: DbPool,
}

impl StageAggregator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Apply one outcome: a counter upsert for the arrival node plus one
    /// pure in-flight upsert per entry in the in-flight deltas map.
    ///
    /// The bucket is the outcome's `received_at` truncated to the minute.
    /// Every statement is an atomic signed-delta upsert, so replays and
    /// concurrent appliers commute.
    pub async fn apply(&self, outcome: &RuleEvaluated) -> Result<(), sqlx::Error> {
        let bucket = minute_bucket(outcome.received_at);

        StageAggregateRepo::upsert(
            &self.pool,
            outcome.workflow_version_id,
            &outcome.group_hash,
            &outcome.node,
            bucket,
            0,
            outcome.completed_delta,
            outcome.late_delta,
            outcome.failed_delta,
        )
        .await?;

        for (node_key, in_flight_delta) in &outcome.in_flight_deltas {
            StageAggregateRepo::upsert(
                &self.pool,
                outcome.workflow_version_id,
                &outcome.group_hash,
                node_key,
                bucket,
                *in_flight_delta,
                0,
                0,
                0,
            )
            .await?;
        }
        Ok(())
    }
}
