//! Integration tests for database migrations and bootstrap helpers.

use sqlx::PgPool;
use uuid::Uuid;

use dayplan_db::config::DbConfig;
use dayplan_db::pool;
use dayplan_test_utils::{create_test_db, drop_test_db, pg_url};

/// Tables created by the initial migration.
const EXPECTED_TABLES: &[&str] = &["daily_plans", "scheduled_tasks", "tasks"];

async fn user_tables(pool: &PgPool) -> Vec<String> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' \
         ORDER BY tablename",
    )
    .fetch_all(pool)
    .await
    .expect("should list tables");

    rows.into_iter()
        .map(|(name,)| name)
        .filter(|name| !name.starts_with("_sqlx"))
        .collect()
}

#[tokio::test]
async fn migrations_create_all_tables() {
    let (pool, db_name) = create_test_db().await;

    assert_eq!(
        user_tables(&pool).await,
        EXPECTED_TABLES,
        "migration should create exactly the expected tables"
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already migrated; a second run is a no-op.
    pool::run_migrations(&pool)
        .await
        .expect("second migration run should succeed");

    let counts = pool::table_counts(&pool).await.expect("should count rows");
    let mut names: Vec<&str> = counts.rows().iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    assert_eq!(names, EXPECTED_TABLES);
    assert!(counts.rows().iter().all(|(_, n)| *n == 0), "tables should be empty");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn table_counts_track_each_table() {
    let (pool, db_name) = create_test_db().await;

    sqlx::query("INSERT INTO tasks (description) VALUES ('a'), ('b')")
        .execute(&pool)
        .await
        .expect("should insert tasks");
    let plan_id: i64 =
        sqlx::query_scalar("INSERT INTO daily_plans (plan_date) VALUES ('2024-03-14') RETURNING id")
            .fetch_one(&pool)
            .await
            .expect("should insert plan");
    sqlx::query(
        "INSERT INTO scheduled_tasks (plan_id, position, title, start_time, end_time) \
         VALUES ($1, 0, 'Standup', '09:00', '09:15')",
    )
    .bind(plan_id)
    .execute(&pool)
    .await
    .expect("should insert entry");

    let counts = pool::table_counts(&pool).await.expect("should count rows");
    assert_eq!(
        counts,
        pool::TableCounts {
            tasks: 2,
            daily_plans: 1,
            scheduled_tasks: 1,
        }
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn plan_date_is_unique() {
    let (pool, db_name) = create_test_db().await;

    sqlx::query("INSERT INTO daily_plans (plan_date) VALUES ('2024-03-14')")
        .execute(&pool)
        .await
        .expect("first insert should succeed");

    let dup = sqlx::query("INSERT INTO daily_plans (plan_date) VALUES ('2024-03-14')")
        .execute(&pool)
        .await;
    assert!(dup.is_err(), "a second plan for the same date must be rejected");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_priority_is_rejected() {
    let (pool, db_name) = create_test_db().await;

    let result = sqlx::query("INSERT INTO tasks (description, priority) VALUES ('x', 'urgent')")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "check constraint should reject 'urgent'");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_database_exists_creates_once() {
    let base_url = pg_url().await;
    let db_name = format!("dayplan_ensure_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{base_url}/{db_name}"));

    let created = pool::ensure_database_exists(&config)
        .await
        .expect("database should be created");
    assert!(created);
    let created_again = pool::ensure_database_exists(&config)
        .await
        .expect("existing database should be accepted");
    assert!(!created_again);

    let db_pool = pool::create_pool(&config).await.expect("should connect");
    pool::run_migrations(&db_pool).await.expect("should migrate");
    assert_eq!(user_tables(&db_pool).await, EXPECTED_TABLES);
    db_pool.close().await;

    drop_test_db(&db_name).await;
}
