//! Repository port for workflow records.

use crate::task::domain::{Workflow, WorkflowId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow repository operations.
pub type WorkflowRepositoryResult<T> = Result<T, WorkflowRepositoryError>;

/// Workflow persistence contract.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a new workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::DuplicateWorkflow`] when the
    /// identifier already exists.
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()>;

    /// Finds a workflow by identifier.
    async fn find_by_id(&self, id: WorkflowId) -> WorkflowRepositoryResult<Option<Workflow>>;
}

/// Errors returned by workflow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRepositoryError {
    /// A workflow with the same identifier already exists.
    #[error("duplicate workflow identifier: {0}")]
    DuplicateWorkflow(WorkflowId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
