use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Priority of a task or a scheduled entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PriorityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Priority`] string.
#[derive(Debug, Clone)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid priority: {:?}", self.0)
    }
}

impl std::error::Error for PriorityParseError {}

// ---------------------------------------------------------------------------

/// Status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Cancelled,
    Rescheduled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskStatus {
    type Err = TaskStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            other => Err(TaskStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`TaskStatus`] string.
#[derive(Debug, Clone)]
pub struct TaskStatusParseError(pub String);

impl fmt::Display for TaskStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid task status: {:?}", self.0)
    }
}

impl std::error::Error for TaskStatusParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A todo item, owned by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: Option<String>,
    pub description: String,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The `daily_plans` row without its entries.
#[derive(Debug, Clone, FromRow)]
pub struct DailyPlanRow {
    pub id: i64,
    #[sqlx(rename = "plan_date")]
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One time slot of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScheduledTask {
    pub id: i64,
    pub plan_id: i64,
    pub position: i32,
    pub task_id: Option<i64>,
    pub title: String,
    pub description: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub priority: Priority,
    pub duration_minutes: Option<i32>,
}

/// A plan for one calendar day together with its ordered entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub id: i64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schedule: Vec<ScheduledTask>,
}

impl DailyPlan {
    pub fn from_parts(row: DailyPlanRow, schedule: Vec<ScheduledTask>) -> Self {
        Self {
            id: row.id,
            date: row.date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            schedule,
        }
    }
}

// ---------------------------------------------------------------------------
// Write models
// ---------------------------------------------------------------------------

/// Fields of a task supplied by a caller on create or full update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "duration_text::deserialize")]
    pub duration: Option<String>,
}

/// A plan entry before it is stored.
///
/// Clients may send camelCase keys and full timestamps for the times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScheduledTask {
    #[serde(default, alias = "taskId")]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "hhmm", alias = "startTime")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm", alias = "endTime")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "durationMinutes")]
    pub duration_minutes: Option<i32>,
}

impl From<&ScheduledTask> for NewScheduledTask {
    fn from(entry: &ScheduledTask) -> Self {
        Self {
            task_id: entry.task_id,
            title: entry.title.clone(),
            description: entry.description.clone(),
            start_time: entry.start_time,
            end_time: entry.end_time,
            priority: entry.priority,
            duration_minutes: entry.duration_minutes,
        }
    }
}

/// A whole plan before it is stored. Entry order is preserved as `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDailyPlan {
    pub date: NaiveDate,
    pub schedule: Vec<NewScheduledTask>,
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// `NaiveTime` as `"HH:MM"`.
///
/// Input may also carry seconds, or be a full timestamp whose time of day
/// is kept.
pub mod hhmm {
    use chrono::{DateTime, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse `HH:MM`, `HH:MM:SS`, an RFC 3339 timestamp or a naive
    /// timestamp into a time of day.
    pub fn parse(input: &str) -> Option<NaiveTime> {
        let input = input.trim();
        if let Ok(time) = NaiveTime::parse_from_str(input, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        {
            return Some(time);
        }
        if let Ok(stamp) = DateTime::parse_from_rfc3339(input) {
            return Some(stamp.time());
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
            .map(|stamp| stamp.time())
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time {raw:?}, expected HH:MM")))
    }
}

/// Durations arrive as free text (`"30"`, `"1h"`) or as bare numbers.
mod duration_text {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(raw.map(|r| match r {
            Raw::Text(s) => s,
            Raw::Int(n) => n.to_string(),
            Raw::Float(f) => f.to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
