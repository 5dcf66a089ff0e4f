use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dayplan_core::dates;
use dayplan_core::planner::{PlanRequest, TaskInput, WorkHours};
use dayplan_db::models::{DailyPlan, NewDailyPlan, NewScheduledTask, ScheduledTask};
use dayplan_db::queries::{plans as plan_db, tasks as task_db};

use crate::serve_cmd::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plan", get(get_day_plan))
        .route("/plan/generate", post(generate_plan))
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{date}", get(get_plan).delete(delete_plan))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    #[serde(default)]
    pub date: Option<String>,
}

/// A stored plan, or the empty plan of a day nothing was stored for
/// (`id: null`).
#[derive(Debug, Serialize)]
pub struct DayPlanResponse {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub schedule: Vec<ScheduledTask>,
}

impl DayPlanResponse {
    fn empty(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            created_at: None,
            updated_at: None,
            schedule: Vec::new(),
        }
    }
}

impl From<DailyPlan> for DayPlanResponse {
    fn from(plan: DailyPlan) -> Self {
        Self {
            id: Some(plan.id),
            date: plan.date,
            created_at: Some(plan.created_at),
            updated_at: Some(plan.updated_at),
            schedule: plan.schedule,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanBody {
    pub date: String,
    #[serde(default, alias = "tasks")]
    pub schedule: Vec<NewScheduledTask>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanBody {
    #[serde(default)]
    pub task_descriptions: Vec<String>,
    #[serde(default)]
    pub task_ids: Vec<i64>,
    /// Fully described tasks, for clients that track tasks themselves.
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub work_hours: Option<WorkHoursBody>,
    #[serde(default)]
    pub preferences: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkHoursBody {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The requested day, or today in the server's local time zone.
fn day_or_today(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(dates::parse_date(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn resolve_work_hours(
    body: Option<&WorkHoursBody>,
    default: WorkHours,
) -> Result<WorkHours, AppError> {
    let Some(body) = body else {
        return Ok(default);
    };
    let start = match body.start.as_deref() {
        Some(raw) => dates::parse_time(raw)?,
        None => default.start,
    };
    let end = match body.end.as_deref() {
        Some(raw) => dates::parse_time(raw)?,
        None => default.end,
    };
    Ok(WorkHours::new(start, end))
}

/// Assemble the task list for a generation request.
///
/// Explicit tasks come first, then bare descriptions, then stored tasks by id
/// in the order requested. With none of those, every open stored task is
/// planned.
async fn resolve_tasks(
    state: &AppState,
    body: &GeneratePlanBody,
) -> Result<Vec<TaskInput>, AppError> {
    let mut tasks: Vec<TaskInput> = body.tasks.clone();
    tasks.extend(
        body.task_descriptions
            .iter()
            .map(|d| TaskInput::from_description(d.as_str())),
    );

    if !body.task_ids.is_empty() {
        let mut ids = body.task_ids.clone();
        ids.sort_unstable();
        ids.dedup();

        let found: HashMap<i64, TaskInput> = task_db::get_tasks_by_ids(&state.pool, &ids)
            .await
            .map_err(AppError::internal)?
            .iter()
            .map(|t| (t.id, TaskInput::from(t)))
            .collect();

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains_key(*id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::bad_request(format!(
                "unknown task ids: {}",
                missing.join(", ")
            )));
        }

        let mut seen = Vec::with_capacity(ids.len());
        for id in &body.task_ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(task) = found.get(id) {
                tasks.push(task.clone());
            }
        }
    }

    if tasks.is_empty() {
        let open = task_db::list_open_tasks(&state.pool)
            .await
            .map_err(AppError::internal)?;
        tasks = open.iter().map(TaskInput::from).collect();
    }

    Ok(tasks)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_day_plan(
    State(state): State<AppState>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> Result<Json<DayPlanResponse>, AppError> {
    let Query(query) = query?;
    let date = day_or_today(query.date.as_deref())?;

    let plan = plan_db::get_plan_by_date(&state.pool, date)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(match plan {
        Some(plan) => plan.into(),
        None => DayPlanResponse::empty(date),
    }))
}

async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<DailyPlan>>, AppError> {
    let plans = plan_db::list_plans(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(plans))
}

async fn get_plan(
    State(state): State<AppState>,
    date: Result<Path<String>, PathRejection>,
) -> Result<Json<DailyPlan>, AppError> {
    let Path(raw) = date?;
    let date = dates::parse_date(&raw)?;

    let plan = plan_db::get_plan_by_date(&state.pool, date)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("no plan for {date}")))?;
    Ok(Json(plan))
}

/// Create or replace the plan for a date.
async fn create_plan(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlanBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DailyPlan>), AppError> {
    let Json(body) = payload?;
    let schedule = body
        .schedule
        .into_iter()
        .map(|entry| NewScheduledTask {
            task_id: entry.task_id.filter(|id| *id > 0),
            ..entry
        })
        .collect();
    let plan = NewDailyPlan {
        date: dates::parse_date(&body.date)?,
        schedule,
    };

    let stored = plan_db::upsert_plan(&state.pool, &plan)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(plan_id = stored.id, date = %stored.date, entries = stored.schedule.len(), "plan saved");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Deleting a day with no plan is not an error.
async fn delete_plan(
    State(state): State<AppState>,
    date: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(raw) = date?;
    let date = dates::parse_date(&raw)?;

    let existing = plan_db::get_plan_by_date(&state.pool, date)
        .await
        .map_err(AppError::internal)?;
    if let Some(plan) = existing {
        plan_db::delete_plan(&state.pool, plan.id)
            .await
            .map_err(AppError::internal)?;
        tracing::info!(plan_id = plan.id, date = %date, "plan deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn generate_plan(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePlanBody>, JsonRejection>,
) -> Result<Json<DailyPlan>, AppError> {
    let Json(body) = payload?;

    let date = day_or_today(body.date.as_deref())?;
    let work_hours = resolve_work_hours(body.work_hours.as_ref(), state.work_hours)?;
    let tasks = resolve_tasks(&state, &body).await?;

    let request = PlanRequest {
        tasks,
        date,
        work_hours,
        preferences: body.preferences,
    };

    let plan = state.planner.generate_and_store(&state.pool, &request).await?;
    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
