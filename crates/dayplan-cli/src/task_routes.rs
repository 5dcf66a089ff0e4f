use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use dayplan_db::models::{NewTask, Task};
use dayplan_db::queries::tasks as task_db;

use crate::serve_cmd::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let Json(new_task) = payload?;
    let task = task_db::insert_task(&state.pool, &new_task)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = task_db::list_tasks(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, AppError> {
    let Path(id) = id?;
    let task = task_db::get_task(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Path(id) = id?;
    let Json(fields) = payload?;
    let task = task_db::update_task(&state.pool, id, &fields)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;
    tracing::info!(task_id = id, "task updated");
    Ok(Json(task))
}

/// Deleting an id that does not exist is not an error.
async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let removed = task_db::delete_task(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    tracing::debug!(task_id = id, removed, "task delete");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
