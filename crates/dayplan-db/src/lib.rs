//! PostgreSQL persistence for tasks and daily plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
