//! Commutativity and clamping of the stage-aggregate upsert.

use chrono::{DurationRound, Utc};
use sqlx::PgPool;

use sentinel_db::models::aggregate::{AggregateWindowQuery, StageAggregate};
use sentinel_db::repositories::StageAggregateRepo;

async fn fetch_single(pool: &PgPool, version_id: i64) -> StageAggregate {
    let rows = StageAggregateRepo::list_window(pool, version_id, &AggregateWindowQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    rows.into_iter().next().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deltas_commute_regardless_of_order(pool: PgPool) {
    let bucket = Utc::now().duration_trunc(chrono::Duration::minutes(1)).unwrap();
    // In-flight deltas kept non-negative here; the clamp (exercised below)
    // intentionally absorbs deficits, which is not order-independent.
    let deltas: [(i32, i32, i32, i32); 4] = [(2, 1, 0, 0), (1, 0, 1, 0), (3, 1, 0, 1), (0, 1, 1, 0)];

    for (in_flight, completed, late, failed) in deltas {
        StageAggregateRepo::upsert(&pool, 1, "default", "ship", bucket, in_flight, completed, late, failed)
            .await
            .unwrap();
    }
    for (in_flight, completed, late, failed) in deltas.iter().rev() {
        StageAggregateRepo::upsert(&pool, 2, "default", "ship", bucket, *in_flight, *completed, *late, *failed)
            .await
            .unwrap();
    }

    let forward = fetch_single(&pool, 1).await;
    let reverse = fetch_single(&pool, 2).await;

    assert_eq!(forward.in_flight, reverse.in_flight);
    assert_eq!(forward.completed, reverse.completed);
    assert_eq!(forward.late, reverse.late);
    assert_eq!(forward.failed, reverse.failed);
    assert_eq!(forward.in_flight, 6);
    assert_eq!(forward.completed, 3);
    assert_eq!(forward.late, 2);
    assert_eq!(forward.failed, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn in_flight_is_clamped_at_zero(pool: PgPool) {
    let bucket = Utc::now().duration_trunc(chrono::Duration::minutes(1)).unwrap();

    // A decrement landing before its matching increment must not go negative.
    StageAggregateRepo::upsert(&pool, 1, "default", "ship", bucket, -5, 0, 0, 0)
        .await
        .unwrap();
    assert_eq!(fetch_single(&pool, 1).await.in_flight, 0);

    StageAggregateRepo::upsert(&pool, 1, "default", "ship", bucket, 3, 0, 0, 0)
        .await
        .unwrap();
    assert_eq!(fetch_single(&pool, 1).await.in_flight, 3);

    StageAggregateRepo::upsert(&pool, 1, "default", "ship", bucket, -10, 0, 0, 0)
        .await
        .unwrap();
    assert_eq!(fetch_single(&pool, 1).await.in_flight, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rows_are_keyed_per_version_group_node_bucket(pool: PgPool) {
    let bucket = Utc::now().duration_trunc(chrono::Duration::minutes(1)).unwrap();
    let earlier = bucket - chrono::Duration::minutes(5);

    StageAggregateRepo::upsert(&pool, 1, "default", "ship", bucket, 0, 1, 0, 0)
        .await
        .unwrap();
    StageAggregateRepo::upsert(&pool, 1, "default", "ship", earlier, 0, 1, 0, 0)
        .await
        .unwrap();
    StageAggregateRepo::upsert(&pool, 1, "abcd1234abcd1234", "ship", bucket, 0, 1, 0, 0)
        .await
        .unwrap();

    let all = StageAggregateRepo::list_window(&pool, 1, &AggregateWindowQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    // Newest bucket first.
    assert_eq!(all.last().unwrap().bucket_start, earlier);

    let filtered = StageAggregateRepo::list_window(
        &pool,
        1,
        &AggregateWindowQuery {
            group_hash: Some("default".to_string()),
            from: Some(bucket),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].group_dim_hash, "default");
}
