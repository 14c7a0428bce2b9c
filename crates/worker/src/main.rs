//! Worker binary: hosts the expectation scheduler.
//!
//! Transport adapters for the inbound normalized-event stream live outside
//! this core; they call [`sentinel_engine::RuleEngine::handle_normalized_event`]
//! through the library API. This binary wires the pool, runs migrations,
//! and drives the scheduler loop until Ctrl-C.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_engine::{EngineConfig, ExpectationScheduler, RuleEngine};
use sentinel_events::OutcomeBus;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_worker=debug,sentinel_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sentinel_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../../db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let bus = Arc::new(OutcomeBus::default());
    let engine = Arc::new(RuleEngine::new(pool.clone(), bus));
    let config = EngineConfig::from_env();

    let cancel = CancellationToken::new();
    let scheduler = ExpectationScheduler::new(pool, engine, config);
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    tracing::info!("Worker started");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl-C");
    tracing::info!("Shutdown signal received, stopping scheduler");
    cancel.cancel();
    let _ = scheduler_task.await;
}
