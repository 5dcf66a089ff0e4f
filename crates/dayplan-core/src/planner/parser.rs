//! Decoding of the model's JSON reply into plan entries.
//!
//! The reply is taken verbatim: entries are neither sorted nor checked for
//! overlap or for fitting the working hours. The only normalization is
//! priority coercion and mapping a `task_id` of 0 to "no task".

use serde::Deserialize;
use thiserror::Error;

use dayplan_db::models::{NewScheduledTask, Priority};

use crate::dates;

/// The reply could not be turned into a schedule.
#[derive(Debug, Error)]
pub enum ReplyParseError {
    #[error("model reply is not valid schedule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model reply entry {index} has invalid {field} {value:?}")]
    InvalidTime {
        index: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(alias = "tasks")]
    schedule: Vec<RawEntry>,
}

/// Models mix key spellings, sometimes within one entry, so alternative
/// keys are separate fields rather than serde aliases.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, alias = "taskId")]
    task_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(alias = "startTime")]
    start_time: String,
    #[serde(alias = "endTime")]
    end_time: String,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default, alias = "durationMinutes")]
    duration_minutes: Option<i32>,
    #[serde(default)]
    duration: Option<serde_json::Value>,
}

impl RawEntry {
    /// Minutes from `duration_minutes`, or from a numeric `duration`.
    fn minutes(&self) -> Option<i32> {
        self.duration_minutes.or_else(|| match self.duration.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().and_then(|m| i32::try_from(m).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

/// Parse the model's reply into entries, in the order the model gave them.
pub fn parse_schedule_reply(reply: &str) -> Result<Vec<NewScheduledTask>, ReplyParseError> {
    let raw: RawReply = serde_json::from_str(strip_code_fence(reply))?;

    raw.schedule
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let start_time = dates::parse_clock_time(&entry.start_time).map_err(|_| {
                ReplyParseError::InvalidTime {
                    index,
                    field: "start_time",
                    value: entry.start_time.clone(),
                }
            })?;
            let end_time = dates::parse_clock_time(&entry.end_time).map_err(|_| {
                ReplyParseError::InvalidTime {
                    index,
                    field: "end_time",
                    value: entry.end_time.clone(),
                }
            })?;

            let duration_minutes = entry.minutes();
            Ok(NewScheduledTask {
                task_id: entry.task_id.or(entry.id).filter(|id| *id > 0),
                title: entry.title.or(entry.name).unwrap_or_default(),
                description: entry.description.unwrap_or_default(),
                start_time,
                end_time,
                priority: coerce_priority(entry.priority.as_ref()),
                duration_minutes,
            })
        })
        .collect()
}

/// Map whatever the model put in `priority` onto [`Priority`], defaulting
/// to medium for anything missing or unrecognized.
pub fn coerce_priority(value: Option<&serde_json::Value>) -> Priority {
    value
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.trim().to_ascii_lowercase().parse().ok())
        .unwrap_or_default()
}

/// Models sometimes wrap JSON in a Markdown fence despite being told not to.
/// The fence may carry a language tag in any case (` ```JSON `).
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
