//! Run aggregate: one execution attempt of a task.

use super::{ExecutionDomainError, ParseRunStatusError, RunId};
use crate::task::domain::{TaskId, WorkflowId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// The pipeline is working on the run.
    Running,
    /// Every step finished.
    Completed,
    /// The pipeline hit a fatal error.
    Failed,
    /// Cancellation was requested while the run was active.
    Cancelled,
}

impl RunStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns `true` for every status other than [`RunStatus::Running`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RunStatus {
    type Error = ParseRunStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ParseRunStatusError(value.to_owned())),
        }
    }
}

/// Run aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    id: RunId,
    workflow_id: WorkflowId,
    task_id: TaskId,
    status: RunStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
    error: Option<String>,
}

/// Parameter object for reconstructing a persisted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRunData {
    /// Persisted run identifier.
    pub id: RunId,
    /// Workflow the run belongs to.
    pub workflow_id: WorkflowId,
    /// Task being executed.
    pub task_id: TaskId,
    /// Persisted status.
    pub status: RunStatus,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp, if finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds, if finished.
    pub duration_ms: Option<u64>,
    /// Failure message, if failed.
    pub error: Option<String>,
}

impl Run {
    /// Starts a new run in the [`RunStatus::Running`] state.
    #[must_use]
    pub fn start(workflow_id: WorkflowId, task_id: TaskId, clock: &impl Clock) -> Self {
        Self {
            id: RunId::new(),
            workflow_id,
            task_id,
            status: RunStatus::Running,
            started_at: clock.utc(),
            completed_at: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Reconstructs a run from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRunData) -> Self {
        Self {
            id: data.id,
            workflow_id: data.workflow_id,
            task_id: data.task_id,
            status: data.status,
            started_at: data.started_at,
            completed_at: data.completed_at,
            duration_ms: data.duration_ms,
            error: data.error,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn id(&self) -> RunId {
        self.id
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the terminal timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the elapsed milliseconds between start and the terminal state.
    #[must_use]
    pub const fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Returns the failure message for failed runs.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Marks the run completed.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidRunTransition`] when the run is
    /// no longer running.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), ExecutionDomainError> {
        self.finish(RunStatus::Completed, None, clock)
    }

    /// Marks the run failed with the given message.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidRunTransition`] when the run is
    /// no longer running.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ExecutionDomainError> {
        self.finish(RunStatus::Failed, Some(error.into()), clock)
    }

    /// Marks the run cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidRunTransition`] when the run is
    /// no longer running.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), ExecutionDomainError> {
        self.finish(RunStatus::Cancelled, None, clock)
    }

    fn finish(
        &mut self,
        target: RunStatus,
        error: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), ExecutionDomainError> {
        if self.status.is_terminal() {
            return Err(ExecutionDomainError::InvalidRunTransition {
                run_id: self.id,
                from: self.status,
                to: target,
            });
        }

        let completed_at = clock.utc();
        let elapsed = completed_at
            .signed_duration_since(self.started_at)
            .num_milliseconds();
        self.status = target;
        self.completed_at = Some(completed_at);
        self.duration_ms = Some(u64::try_from(elapsed).unwrap_or(0));
        self.error = error;
        Ok(())
    }
}
