pub mod plans;
pub mod tasks;
