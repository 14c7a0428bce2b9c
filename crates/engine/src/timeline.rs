//! Correlation timeline read model.
//!
//! Composes one correlation key's full picture (runs, occurrence log,
//! pending expectations, alerts) for item-drilldown views.

use serde::Serialize;

use sentinel_core::types::DbId;
use sentinel_db::models::alert::Alert;
use sentinel_db::models::expectation::Expectation;
use sentinel_db::models::run::{EventOccurrence, WorkflowRun};
use sentinel_db::repositories::{AlertRepo, ExpectationRepo, OccurrenceRepo, RunRepo};
use sentinel_db::DbPool;

/// Full timeline for one correlation key.
#[derive(Debug, Serialize)]
pub struct CorrelationTimeline {
    pub correlation_key: String,
    pub runs: Vec<RunTimeline>,
}

/// One run's slice of the timeline.
#[derive(Debug, Serialize)]
pub struct RunTimeline {
    pub run: WorkflowRun,
    pub occurrences: Vec<EventOccurrence>,
    pub pending_expectations: Vec<Expectation>,
    pub alerts: Vec<Alert>,
}

/// Assemble the timeline, optionally restricted to one workflow version.
pub async fn correlation_timeline(
    pool: &DbPool,
    correlation_key: &str,
    workflow_version_id: Option<DbId>,
) -> Result<CorrelationTimeline, sqlx::Error> {
    let runs = RunRepo::list_by_correlation(pool, correlation_key, workflow_version_id).await?;

    let mut timelines = Vec::with_capacity(runs.len());
    for run in runs {
        let occurrences = OccurrenceRepo::list_for_run(pool, run.id).await?;
        let pending_expectations = ExpectationRepo::list_pending_for_run(pool, run.id).await?;
        let alerts =
            AlertRepo::list_for_correlation(pool, correlation_key, Some(run.workflow_version_id))
                .await?;
        timelines.push(RunTimeline {
            run,
            occurrences,
            pending_expectations,
            alerts,
        });
    }

    Ok(CorrelationTimeline {
        correlation_key: correlation_key.to_string(),
        runs: timelines,
    })
}
