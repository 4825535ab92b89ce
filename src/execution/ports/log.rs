//! Repository port for execution log entries.

use crate::execution::domain::{ExecutionLog, RunId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for execution log operations.
pub type ExecutionLogRepositoryResult<T> = Result<T, ExecutionLogRepositoryError>;

/// Append-only log persistence contract.
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionLogRepositoryError::Persistence`] when the write
    /// fails.
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()>;

    /// Returns up to `limit` entries of a run in ascending timestamp order.
    ///
    /// Entries sharing a timestamp keep their insertion order.
    async fn list_by_run(
        &self,
        run_id: RunId,
        limit: usize,
    ) -> ExecutionLogRepositoryResult<Vec<ExecutionLog>>;
}

/// Errors returned by execution log repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ExecutionLogRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ExecutionLogRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
