//! Diesel row models for run and execution log persistence.

use super::schema::{execution_logs, runs};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for run records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RunRow {
    /// Run identifier.
    pub id: uuid::Uuid,
    /// Workflow identifier.
    pub workflow_id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds.
    pub duration_ms: Option<i64>,
    /// Failure message.
    pub error: Option<String>,
}

/// Insert model for run records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = runs)]
pub struct NewRunRow {
    /// Run identifier.
    pub id: uuid::Uuid,
    /// Workflow identifier.
    pub workflow_id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds.
    pub duration_ms: Option<i64>,
    /// Failure message.
    pub error: Option<String>,
}

/// Changeset written when a run reaches a terminal state.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = runs)]
#[diesel(treat_none_as_null = true)]
pub struct RunFinishChangeset {
    /// Terminal status.
    pub status: String,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds.
    pub duration_ms: Option<i64>,
    /// Failure message.
    pub error: Option<String>,
}

/// Query result row for execution log records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = execution_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutionLogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning run.
    pub run_id: uuid::Uuid,
    /// Severity.
    pub level: String,
    /// Message.
    pub message: String,
    /// Structured payload.
    pub data: Value,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Insert model for execution log records; `sequence` is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = execution_logs)]
pub struct NewExecutionLogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning run.
    pub run_id: uuid::Uuid,
    /// Severity.
    pub level: String,
    /// Message.
    pub message: String,
    /// Structured payload.
    pub data: Value,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}
