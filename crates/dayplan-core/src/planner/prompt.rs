//! Prompt construction. Pure string building, no I/O.
//!
//! The output is fully determined by the [`PlanRequest`], so equal requests
//! always produce byte-identical prompts.

use std::fmt::Write as _;

use crate::dates::DATE_FORMAT;
use crate::llm::CompletionRequest;

use super::types::{PlanRequest, TaskInput};

/// Role, scheduling rules and the exact reply shape.
pub const SYSTEM_PROMPT: &str = r#"You are an assistant that helps people plan their working day.
Build a schedule for the requested date from the listed tasks, inside the given working hours.

Rules:
- Give every task a start time and an end time within the working hours.
- Consider priorities, due dates and durations when ordering tasks.
- Make sure no two entries overlap.
- Schedule short breaks where appropriate.
- Reply with the JSON object only, without explanations.

Reply format:
{
  "schedule": [
    {
      "task_id": <id of the task if one was given, otherwise 0>,
      "title": "<short title>",
      "description": "<what to do>",
      "start_time": "HH:MM",
      "end_time": "HH:MM",
      "priority": "low" | "medium" | "high",
      "duration_minutes": <integer>
    }
  ]
}
All times use the 24-hour clock."#;

/// Build the system/user prompt pair for a plan request.
pub fn build_completion_request(request: &PlanRequest) -> CompletionRequest {
    CompletionRequest {
        system: SYSTEM_PROMPT.to_owned(),
        user: build_user_prompt(request),
    }
}

/// Build the user prompt: date, working hours, tasks, preferences.
pub fn build_user_prompt(request: &PlanRequest) -> String {
    let mut prompt = String::with_capacity(256 + request.tasks.len() * 80);

    let _ = writeln!(
        prompt,
        "Please plan my day for {}.",
        request.date.format(DATE_FORMAT)
    );
    let _ = writeln!(
        prompt,
        "Working hours: from {} to {}.",
        request.work_hours.start.format("%H:%M"),
        request.work_hours.end.format("%H:%M")
    );

    prompt.push_str("My tasks:\n");
    if request.tasks.is_empty() {
        prompt.push_str("(no tasks)\n");
    }
    for (i, task) in request.tasks.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, describe_task(task));
    }

    let preferences = request
        .preferences
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("none");
    let _ = writeln!(prompt, "Additional preferences: {preferences}");

    prompt.push_str("\nOutput the schedule as JSON.");
    prompt
}

/// One task line: the description followed by whatever attributes are known.
fn describe_task(task: &TaskInput) -> String {
    let mut attrs: Vec<String> = Vec::new();
    if let Some(id) = task.id {
        attrs.push(format!("id: {id}"));
    }
    if let Some(name) = task.name.as_deref().filter(|n| !n.trim().is_empty()) {
        attrs.push(format!("name: {}", name.trim()));
    }
    if let Some(priority) = task.priority {
        attrs.push(format!("priority: {priority}"));
    }
    if let Some(duration) = task.duration.as_deref().filter(|d| !d.trim().is_empty()) {
        attrs.push(format!("duration: {}", describe_duration(duration.trim())));
    }
    if let Some(due) = task.due_date {
        attrs.push(format!("due: {}", due.format(DATE_FORMAT)));
    }

    let description = task.description.trim();
    if attrs.is_empty() {
        description.to_owned()
    } else {
        format!("{description} ({})", attrs.join("; "))
    }
}

/// Bare numbers are minutes; anything else is passed through.
fn describe_duration(duration: &str) -> String {
    if duration.chars().all(|c| c.is_ascii_digit()) {
        format!("{duration} minutes")
    } else {
        duration.to_owned()
    }
}
