//! Find-or-create semantics for runs and the occurrence dedup probe.

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use sentinel_db::models::run::CreateOccurrence;
use sentinel_db::repositories::{OccurrenceRepo, RunRepo};

async fn seed_version(pool: &PgPool, key: &str) -> i64 {
    let workflow_id: i64 =
        sqlx::query_scalar("INSERT INTO workflow (key, name) VALUES ($1, $1) RETURNING id")
            .bind(key)
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query_scalar(
        "INSERT INTO workflow_version (workflow_id, version_num, status) \
         VALUES ($1, 1, 'published') RETURNING id",
    )
    .bind(workflow_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_or_create_converges_on_one_row(pool: PgPool) {
    let version_id = seed_version(&pool, "orders").await;
    let group = json!({"region": "NY"});
    let started = Utc::now();

    let (first, created_first) =
        RunRepo::find_or_create(&pool, version_id, "order-1", &group, started)
            .await
            .unwrap();
    let (second, created_second) =
        RunRepo::find_or_create(&pool, version_id, "order-1", &group, started)
            .await
            .unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
    assert_eq!(first.status, "green");
    assert_eq!(first.group_dims, Some(group));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_find_or_create_returns_same_run(pool: PgPool) {
    let version_id = seed_version(&pool, "orders").await;
    let group = json!({"region": "NY"});
    let started = Utc::now();

    let (a, b) = tokio::join!(
        RunRepo::find_or_create(&pool, version_id, "order-race", &group, started),
        RunRepo::find_or_create(&pool, version_id, "order-race", &group, started),
    );
    let (run_a, _) = a.unwrap();
    let (run_b, _) = b.unwrap();
    assert_eq!(run_a.id, run_b.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_status_refreshes_the_cache(pool: PgPool) {
    let version_id = seed_version(&pool, "orders").await;
    let (run, _) =
        RunRepo::find_or_create(&pool, version_id, "order-1", &json!({}), Utc::now())
            .await
            .unwrap();

    RunRepo::update_status(&pool, run.id, "red", "ship").await.unwrap();

    let reloaded = RunRepo::find_by_id(&pool, run.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, "red");
    assert_eq!(reloaded.last_node_key.as_deref(), Some("ship"));
    assert!(reloaded.updated_at >= run.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recent_listing_orders_by_update_time(pool: PgPool) {
    let version_id = seed_version(&pool, "orders").await;
    for key in ["order-1", "order-2", "order-3"] {
        RunRepo::find_or_create(&pool, version_id, key, &json!({}), Utc::now())
            .await
            .unwrap();
    }
    let (second, _) =
        RunRepo::find_or_create(&pool, version_id, "order-2", &json!({}), Utc::now())
            .await
            .unwrap();
    RunRepo::update_status(&pool, second.id, "amber", "ship").await.unwrap();

    let recent = RunRepo::list_recent(&pool, version_id, 10).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].correlation_key, "order-2");

    let by_correlation = RunRepo::list_by_correlation(&pool, "order-2", Some(version_id))
        .await
        .unwrap();
    assert_eq!(by_correlation.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn has_seen_event_matches_only_recorded_ids(pool: PgPool) {
    let version_id = seed_version(&pool, "orders").await;
    let (run, _) =
        RunRepo::find_or_create(&pool, version_id, "order-1", &json!({}), Utc::now())
            .await
            .unwrap();

    let now = Utc::now();
    OccurrenceRepo::insert(
        &pool,
        run.id,
        &CreateOccurrence {
            node_key: "ingest".to_string(),
            event_id: Some("evt-1".to_string()),
            event_time_utc: now,
            received_at: now,
            payload_excerpt: None,
            is_late: false,
            is_duplicate: false,
            order_violation: false,
        },
    )
    .await
    .unwrap();

    assert!(OccurrenceRepo::has_seen_event(&pool, run.id, "evt-1").await.unwrap());
    assert!(!OccurrenceRepo::has_seen_event(&pool, run.id, "evt-2").await.unwrap());

    let occurrences = OccurrenceRepo::list_for_run(&pool, run.id).await.unwrap();
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].node_key, "ingest");
}
