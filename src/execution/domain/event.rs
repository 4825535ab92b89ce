//! Realtime progress events and their routing keys.

use super::{RunId, UserId};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// The task received a category.
    Classified,
    /// The plan is ready.
    Planned,
    /// A step finished; carries the overall progress percentage.
    Executing,
    /// The run completed.
    Completed,
    /// The run failed.
    Failed,
    /// The run was cancelled.
    Cancelled,
}

impl ProgressEventKind {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::Planned => "planned",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProgressEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-durable notification about a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Event name.
    #[serde(rename = "event")]
    pub kind: ProgressEventKind,
    /// Task being executed.
    pub task_id: TaskId,
    /// Run the event belongs to.
    pub run_id: RunId,
    /// Event-specific payload.
    pub payload: Value,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Logical pub/sub channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Returns the per-user channel (`user:<id>`).
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self(format!("user:{user_id}"))
    }

    /// Returns the channel name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers that travel with every event of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// Task being executed.
    pub task_id: TaskId,
    /// Current run.
    pub run_id: RunId,
    /// User who requested the execution.
    pub user_id: UserId,
}

impl RunContext {
    /// Creates a run context.
    #[must_use]
    pub const fn new(task_id: TaskId, run_id: RunId, user_id: UserId) -> Self {
        Self {
            task_id,
            run_id,
            user_id,
        }
    }

    /// Returns the channel the run's events are published on.
    #[must_use]
    pub fn channel(&self) -> ChannelKey {
        ChannelKey::for_user(self.user_id)
    }

    /// Builds an event stamped with the context's identifiers.
    #[must_use]
    pub fn event(&self, kind: ProgressEventKind, payload: Value, clock: &impl Clock) -> ProgressEvent {
        ProgressEvent {
            kind,
            task_id: self.task_id,
            run_id: self.run_id,
            payload,
            timestamp: clock.utc(),
        }
    }
}
