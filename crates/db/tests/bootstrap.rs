use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    surgiguide_db::health_check(&pool).await.unwrap();

    let tables = [
        "client_profiles",
        "designer_profiles",
        "cases",
        "case_status_history",
        "case_quotes",
        "discount_codes",
        "discount_usages",
        "payments",
        "notifications",
    ];

    for table in tables {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists.0, "table {table} should exist after migrations");
    }
}

/// The case number sequence is created by the migrations.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_case_number_sequence_exists(pool: PgPool) {
    let first: (i64,) = sqlx::query_as("SELECT nextval('case_number_seq')")
        .fetch_one(&pool)
        .await
        .unwrap();
    let second: (i64,) = sqlx::query_as("SELECT nextval('case_number_seq')")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(second.0, first.0 + 1);
}
