//! Dedupe and lifecycle semantics of the alert store.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use sentinel_db::models::alert::UpsertAlert;
use sentinel_db::repositories::AlertRepo;

fn trigger(dedupe_key: &str, severity: &str) -> UpsertAlert {
    UpsertAlert {
        correlation_key: "order-1".to_string(),
        workflow_version_id: 1,
        node_key: "ship".to_string(),
        severity: severity.to_string(),
        dedupe_key: dedupe_key.to_string(),
        triggered_at: Utc::now(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn first_trigger_opens_an_alert(pool: PgPool) {
    let alert = AlertRepo::upsert_trigger(&pool, &trigger("1:ship:order-1", "amber"))
        .await
        .unwrap();

    assert_eq!(alert.state, "open");
    assert_eq!(alert.severity, "amber");
    assert_eq!(alert.last_triggered_at, Some(alert.first_triggered_at));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_trigger_refreshes_without_duplicating(pool: PgPool) {
    let first = AlertRepo::upsert_trigger(&pool, &trigger("1:ship:order-1", "amber"))
        .await
        .unwrap();

    let mut second = trigger("1:ship:order-1", "red");
    second.triggered_at = Utc::now() + Duration::seconds(30);
    let updated = AlertRepo::upsert_trigger(&pool, &second).await.unwrap();

    assert_eq!(updated.id, first.id);
    assert_eq!(updated.severity, "red");
    assert_eq!(updated.first_triggered_at, first.first_triggered_at);
    assert!(updated.last_triggered_at > first.last_triggered_at);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM alert")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolved_alert_reopens_on_trigger(pool: PgPool) {
    let alert = AlertRepo::upsert_trigger(&pool, &trigger("1:ship:order-1", "amber"))
        .await
        .unwrap();
    AlertRepo::set_state(&pool, alert.id, "resolved", "ops", None)
        .await
        .unwrap()
        .unwrap();

    let reopened = AlertRepo::upsert_trigger(&pool, &trigger("1:ship:order-1", "amber"))
        .await
        .unwrap();
    assert_eq!(reopened.state, "open");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn acked_alert_keeps_state_on_trigger(pool: PgPool) {
    let alert = AlertRepo::upsert_trigger(&pool, &trigger("1:ship:order-1", "amber"))
        .await
        .unwrap();
    AlertRepo::set_state(&pool, alert.id, "ack", "ops", None)
        .await
        .unwrap()
        .unwrap();

    let mut next = trigger("1:ship:order-1", "red");
    next.triggered_at = Utc::now() + Duration::seconds(30);
    let after = AlertRepo::upsert_trigger(&pool, &next).await.unwrap();

    assert_eq!(after.state, "ack");
    assert_eq!(after.severity, "red");
    assert!(after.last_triggered_at > alert.last_triggered_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_state_on_unknown_id_returns_none(pool: PgPool) {
    let missing = AlertRepo::set_state(&pool, 9999, "ack", "ops", None)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_filters_by_state_newest_first(pool: PgPool) {
    for (idx, severity) in ["amber", "red", "green"].iter().enumerate() {
        let mut input = trigger(&format!("1:ship:order-{idx}"), severity);
        input.triggered_at = Utc::now() + Duration::seconds(idx as i64);
        AlertRepo::upsert_trigger(&pool, &input).await.unwrap();
    }
    let all = AlertRepo::list(&pool, None, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all[0].last_triggered_at >= all[1].last_triggered_at);

    AlertRepo::set_state(&pool, all[0].id, "ack", "ops", None)
        .await
        .unwrap()
        .unwrap();

    let open = AlertRepo::list(&pool, Some("open"), 10).await.unwrap();
    assert_eq!(open.len(), 2);
    let acked = AlertRepo::list(&pool, Some("ack"), 10).await.unwrap();
    assert_eq!(acked.len(), 1);
}
