use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    sentinel_db::health_check(&pool).await.unwrap();

    // Verify all core tables exist and start empty.
    let tables = [
        "workflow",
        "workflow_version",
        "workflow_node",
        "workflow_edge",
        "workflow_run",
        "event_occurrence",
        "expectation",
        "alert",
        "audit_log",
        "stage_aggregate",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}
