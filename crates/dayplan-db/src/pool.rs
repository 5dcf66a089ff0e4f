use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/dayplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Pool used by the HTTP handlers and the planner.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(applied = MIGRATOR.iter().count(), "schema is up to date");
    Ok(())
}

/// Create the configured database when it is missing.
///
/// Returns `true` if this call created it.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let url = config.database_url.as_str();
    let name = config
        .database_name()
        .with_context(|| format!("no database name in {url}"))?;

    let exists = Postgres::database_exists(url)
        .await
        .with_context(|| format!("failed to check whether database {name} exists"))?;
    if exists {
        info!(db = name, "database already exists");
        return Ok(false);
    }

    Postgres::create_database(url)
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    info!(db = name, "database created");
    Ok(true)
}

/// Row counts of the dayplan tables, as shown by `dayplan db-init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct TableCounts {
    pub tasks: i64,
    pub daily_plans: i64,
    pub scheduled_tasks: i64,
}

impl TableCounts {
    /// `(table, rows)` pairs in schema order.
    pub fn rows(&self) -> [(&'static str, i64); 3] {
        [
            ("tasks", self.tasks),
            ("daily_plans", self.daily_plans),
            ("scheduled_tasks", self.scheduled_tasks),
        ]
    }
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts> {
    sqlx::query_as::<_, TableCounts>(
        "SELECT \
           (SELECT COUNT(*) FROM tasks) AS tasks, \
           (SELECT COUNT(*) FROM daily_plans) AS daily_plans, \
           (SELECT COUNT(*) FROM scheduled_tasks) AS scheduled_tasks",
    )
    .fetch_one(pool)
    .await
    .context("failed to count rows")
}
