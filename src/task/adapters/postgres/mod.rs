//! `PostgreSQL` adapters for task and workflow persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, PostgresWorkflowRepository, TaskPgPool};
