//! Append-only execution log entries.

use super::{LogId, ParseLogLevelError, RunId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Lifecycle milestone.
    Info,
    /// Fatal pipeline error.
    Error,
}

impl LogLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LogLevel {
    type Error = ParseLogLevelError;

    fn try_from(value: &str) -> Result<Self, <Self as TryFrom<&str>>::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Self::Info),
            "ERROR" => Ok(Self::Error),
            _ => Err(ParseLogLevelError(value.to_owned())),
        }
    }
}

/// One immutable record of a run event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    id: LogId,
    run_id: RunId,
    level: LogLevel,
    message: String,
    data: Value,
    timestamp: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLogData {
    /// Persisted entry identifier.
    pub id: LogId,
    /// Run the entry belongs to.
    pub run_id: RunId,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured payload.
    pub data: Value,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ExecutionLog {
    /// Creates an `INFO` entry.
    #[must_use]
    pub fn info(run_id: RunId, message: impl Into<String>, data: Value, clock: &impl Clock) -> Self {
        Self::new(run_id, LogLevel::Info, message.into(), data, clock)
    }

    /// Creates an `ERROR` entry.
    #[must_use]
    pub fn error(
        run_id: RunId,
        message: impl Into<String>,
        data: Value,
        clock: &impl Clock,
    ) -> Self {
        Self::new(run_id, LogLevel::Error, message.into(), data, clock)
    }

    fn new(run_id: RunId, level: LogLevel, message: String, data: Value, clock: &impl Clock) -> Self {
        Self {
            id: LogId::new(),
            run_id,
            level,
            message,
            data,
            timestamp: clock.utc(),
        }
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLogData) -> Self {
        Self {
            id: data.id,
            run_id: data.run_id,
            level: data.level,
            message: data.message,
            data: data.data,
            timestamp: data.timestamp,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> LogId {
        self.id
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Returns the severity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
