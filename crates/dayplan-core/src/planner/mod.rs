//! Plan generation: prompt construction, reply parsing, and the service
//! that ties them to a text-generation backend.

pub mod error;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod types;

pub use error::GenerateError;
pub use parser::{ReplyParseError, coerce_priority, parse_schedule_reply};
pub use prompt::{SYSTEM_PROMPT, build_completion_request, build_user_prompt};
pub use service::PlanGenerator;
pub use types::{PlanRequest, TaskInput, WorkHours};
