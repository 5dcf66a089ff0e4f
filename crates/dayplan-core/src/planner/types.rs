use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use dayplan_db::models::{Priority, Task, hhmm};

/// What the model is told about one task. Only `description` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TaskInput {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }
}

impl From<&Task> for TaskInput {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id),
            name: task.name.clone(),
            description: task.description.clone(),
            duration: task.duration.clone(),
            priority: task.priority,
            due_date: None,
        }
    }
}

/// The working-hours window a plan must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl WorkHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl Default for WorkHours {
    /// 09:00 to 17:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }
}

/// Everything needed to ask the model for one day's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub tasks: Vec<TaskInput>,
    pub date: NaiveDate,
    pub work_hours: WorkHours,
    pub preferences: Option<String>,
}
