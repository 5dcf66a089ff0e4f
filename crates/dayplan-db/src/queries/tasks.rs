//! Database query functions for the `tasks` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{NewTask, Task};

/// Insert a new task row. Returns the stored task with its assigned id.
pub async fn insert_task(pool: &PgPool, task: &NewTask) -> Result<Task> {
    let task = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (name, description, priority, status, duration) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(&task.duration)
    .fetch_one(pool)
    .await
    .context("failed to insert task")?;

    Ok(task)
}

/// Fetch a single task by ID.
pub async fn get_task(pool: &PgPool, id: i64) -> Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch task")?;

    Ok(task)
}

/// Fetch every task whose id is in `ids`. Missing ids are silently skipped;
/// compare lengths to detect them.
pub async fn get_tasks_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ANY($1) ORDER BY id")
        .bind(ids)
        .fetch_all(pool)
        .await
        .context("failed to fetch tasks by id")?;

    Ok(tasks)
}

/// List all tasks.
pub async fn list_tasks(pool: &PgPool) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list tasks")?;

    Ok(tasks)
}

/// List tasks that still need scheduling: no status, `pending`, or
/// `rescheduled`.
pub async fn list_open_tasks(pool: &PgPool) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks \
         WHERE status IS NULL OR status IN ('pending', 'rescheduled') \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("failed to list open tasks")?;

    Ok(tasks)
}

/// Replace every mutable field of a task.
///
/// Returns `None` when no task has this id.
pub async fn update_task(pool: &PgPool, id: i64, task: &NewTask) -> Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks \
         SET name = $1, description = $2, priority = $3, status = $4, duration = $5 \
         WHERE id = $6 \
         RETURNING *",
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(&task.duration)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to update task {id}"))?;

    Ok(task)
}

/// Delete a task. Deleting an absent id is not an error; the return value
/// says whether a row was removed.
pub async fn delete_task(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete task {id}"))?;

    Ok(result.rows_affected() > 0)
}
