//! Repository port for run records.

use crate::execution::domain::{Run, RunId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for run repository operations.
pub type RunRepositoryResult<T> = Result<T, RunRepositoryError>;

/// Run persistence contract.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Stores a newly started run.
    ///
    /// # Errors
    ///
    /// Returns [`RunRepositoryError::DuplicateRun`] when the identifier
    /// already exists.
    async fn store(&self, run: &Run) -> RunRepositoryResult<()>;

    /// Writes the terminal state of `run`.
    ///
    /// The write only succeeds while the stored run is still `RUNNING`, so
    /// each run receives exactly one terminal transition even when
    /// cancellation and the pipeline race.
    ///
    /// # Errors
    ///
    /// Returns [`RunRepositoryError::NotFound`] for unknown runs and
    /// [`RunRepositoryError::NotRunning`] when the stored run already
    /// finished.
    async fn finish(&self, run: &Run) -> RunRepositoryResult<()>;

    /// Finds a run by identifier.
    async fn find_by_id(&self, id: RunId) -> RunRepositoryResult<Option<Run>>;

    /// Returns every run of a task, oldest first.
    async fn list_by_task(&self, task_id: TaskId) -> RunRepositoryResult<Vec<Run>>;
}

/// Errors returned by run repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RunRepositoryError {
    /// A run with the same identifier already exists.
    #[error("duplicate run identifier: {0}")]
    DuplicateRun(RunId),

    /// The run was not found.
    #[error("run not found: {0}")]
    NotFound(RunId),

    /// The stored run already reached a terminal state.
    #[error("run {0} is no longer running")]
    NotRunning(RunId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
