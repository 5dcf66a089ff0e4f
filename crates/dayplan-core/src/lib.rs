//! Plan generation for dayplan: date handling, the text-generation client,
//! and the planner service.

pub mod dates;
pub mod llm;
pub mod planner;
