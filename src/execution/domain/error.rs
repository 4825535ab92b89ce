//! Error types for the execution domain.

use super::{RunId, RunStatus};
use thiserror::Error;

/// Errors returned by run state transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionDomainError {
    /// The run is already in a terminal state.
    #[error("invalid status transition for run {run_id}: {from} -> {to}")]
    InvalidRunTransition {
        /// Run whose transition was rejected.
        run_id: RunId,
        /// Current status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },
}

/// Error returned while parsing run statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown run status: {0}")]
pub struct ParseRunStatusError(pub String);

/// Error returned while parsing log levels from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLogLevelError(pub String);

/// Errors returned while decoding a model-produced plan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanParseError {
    /// The response contains no JSON object.
    #[error("no JSON object found in model output")]
    NoJsonObject,

    /// The JSON object could not be decoded.
    #[error("malformed plan JSON: {0}")]
    Malformed(String),
}
