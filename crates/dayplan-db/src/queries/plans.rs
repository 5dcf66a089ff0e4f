//! Database query functions for the `daily_plans` and `scheduled_tasks`
//! tables.
//!
//! A plan and its entries are always written together inside one
//! transaction, so readers never observe a plan with a partial schedule.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::models::{DailyPlan, DailyPlanRow, NewDailyPlan, NewScheduledTask, ScheduledTask};

/// Insert a plan for a date that has none yet.
///
/// Returns `None` without writing anything when a plan for `plan.date`
/// already exists. Use [`upsert_plan`] for create-or-replace.
pub async fn insert_plan(pool: &PgPool, plan: &NewDailyPlan) -> Result<Option<DailyPlan>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let row = sqlx::query_as::<_, DailyPlanRow>(
        "INSERT INTO daily_plans (plan_date) VALUES ($1) \
         ON CONFLICT (plan_date) DO NOTHING \
         RETURNING *",
    )
    .bind(plan.date)
    .fetch_optional(&mut *tx)
    .await
    .with_context(|| format!("failed to insert plan for {}", plan.date))?;

    let Some(row) = row else {
        debug!(date = %plan.date, "plan already exists, insert skipped");
        return Ok(None);
    };

    let schedule = insert_entries(&mut tx, row.id, &plan.schedule).await?;
    tx.commit().await.context("failed to commit transaction")?;

    Ok(Some(DailyPlan::from_parts(row, schedule)))
}

/// Create the plan for `plan.date`, or replace the schedule of the existing
/// one.
///
/// The date row is claimed with `INSERT .. ON CONFLICT DO UPDATE`, which
/// takes a row lock, so concurrent upserts for the same date run one after
/// the other and always leave exactly one plan. The existing plan keeps its
/// `id` and `created_at`.
pub async fn upsert_plan(pool: &PgPool, plan: &NewDailyPlan) -> Result<DailyPlan> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let row = sqlx::query_as::<_, DailyPlanRow>(
        "INSERT INTO daily_plans (plan_date) VALUES ($1) \
         ON CONFLICT (plan_date) DO UPDATE SET updated_at = now() \
         RETURNING *",
    )
    .bind(plan.date)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("failed to upsert plan for {}", plan.date))?;

    delete_entries(&mut tx, row.id).await?;
    let schedule = insert_entries(&mut tx, row.id, &plan.schedule).await?;
    tx.commit().await.context("failed to commit transaction")?;

    debug!(plan_id = row.id, date = %row.date, entries = schedule.len(), "plan upserted");
    Ok(DailyPlan::from_parts(row, schedule))
}

/// Fetch a plan and its entries by ID.
pub async fn get_plan(pool: &PgPool, id: i64) -> Result<Option<DailyPlan>> {
    let row = sqlx::query_as::<_, DailyPlanRow>("SELECT * FROM daily_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    match row {
        Some(row) => {
            let schedule = list_entries(pool, row.id).await?;
            Ok(Some(DailyPlan::from_parts(row, schedule)))
        }
        None => Ok(None),
    }
}

/// Fetch the plan for one calendar day.
pub async fn get_plan_by_date(pool: &PgPool, date: NaiveDate) -> Result<Option<DailyPlan>> {
    let row =
        sqlx::query_as::<_, DailyPlanRow>("SELECT * FROM daily_plans WHERE plan_date = $1")
            .bind(date)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("failed to fetch plan for {date}"))?;

    match row {
        Some(row) => {
            let schedule = list_entries(pool, row.id).await?;
            Ok(Some(DailyPlan::from_parts(row, schedule)))
        }
        None => Ok(None),
    }
}

/// List all plans ordered by date, each with its entries loaded.
pub async fn list_plans(pool: &PgPool) -> Result<Vec<DailyPlan>> {
    let rows = sqlx::query_as::<_, DailyPlanRow>("SELECT * FROM daily_plans ORDER BY plan_date")
        .fetch_all(pool)
        .await
        .context("failed to list plans")?;

    let entries = sqlx::query_as::<_, ScheduledTask>(
        "SELECT * FROM scheduled_tasks ORDER BY plan_id, position",
    )
    .fetch_all(pool)
    .await
    .context("failed to list scheduled tasks")?;

    let mut by_plan: HashMap<i64, Vec<ScheduledTask>> = HashMap::new();
    for entry in entries {
        by_plan.entry(entry.plan_id).or_default().push(entry);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let schedule = by_plan.remove(&row.id).unwrap_or_default();
            DailyPlan::from_parts(row, schedule)
        })
        .collect())
}

/// Replace a plan's date and schedule.
///
/// Returns `None` when no plan has this id. Moving a plan onto a date that
/// already has another plan fails with a unique-constraint error.
pub async fn update_plan(pool: &PgPool, id: i64, plan: &NewDailyPlan) -> Result<Option<DailyPlan>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let row = sqlx::query_as::<_, DailyPlanRow>(
        "UPDATE daily_plans SET plan_date = $1, updated_at = now() \
         WHERE id = $2 \
         RETURNING *",
    )
    .bind(plan.date)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .with_context(|| format!("failed to update plan {id}"))?;

    let Some(row) = row else {
        return Ok(None);
    };

    delete_entries(&mut tx, row.id).await?;
    let schedule = insert_entries(&mut tx, row.id, &plan.schedule).await?;
    tx.commit().await.context("failed to commit transaction")?;

    Ok(Some(DailyPlan::from_parts(row, schedule)))
}

/// Delete a plan and, by cascade, its entries. Absent ids are not an error.
pub async fn delete_plan(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM daily_plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete plan {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Count plans stored for a date. Always 0 or 1 given the unique constraint.
pub async fn count_plans_for_date(pool: &PgPool, date: NaiveDate) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM daily_plans WHERE plan_date = $1")
        .bind(date)
        .fetch_one(pool)
        .await
        .context("failed to count plans")?;

    Ok(row.0)
}

// -----------------------------------------------------------------------
// Entry helpers
// -----------------------------------------------------------------------

async fn list_entries(pool: &PgPool, plan_id: i64) -> Result<Vec<ScheduledTask>> {
    let entries = sqlx::query_as::<_, ScheduledTask>(
        "SELECT * FROM scheduled_tasks WHERE plan_id = $1 ORDER BY position",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list entries of plan {plan_id}"))?;

    Ok(entries)
}

async fn delete_entries(conn: &mut PgConnection, plan_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM scheduled_tasks WHERE plan_id = $1")
        .bind(plan_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("failed to clear entries of plan {plan_id}"))?;

    Ok(())
}

async fn insert_entries(
    conn: &mut PgConnection,
    plan_id: i64,
    entries: &[NewScheduledTask],
) -> Result<Vec<ScheduledTask>> {
    let mut stored = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let position = i32::try_from(position).context("plan has too many entries")?;
        let row = sqlx::query_as::<_, ScheduledTask>(
            "INSERT INTO scheduled_tasks \
             (plan_id, position, task_id, title, description, start_time, end_time, priority, duration_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(plan_id)
        .bind(position)
        .bind(entry.task_id)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.priority)
        .bind(entry.duration_minutes)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to insert entry {position} of plan {plan_id}"))?;

        stored.push(row);
    }

    Ok(stored)
}
