//! `PostgreSQL` adapters for run and execution log persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresExecutionLogRepository, PostgresRunRepository};
