//! In-memory repository for execution log entries.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::execution::{
    domain::{ExecutionLog, RunId},
    ports::{ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult},
};

/// Thread-safe in-memory execution log repository.
///
/// Entries are kept per run in insertion order, which is also timestamp
/// order for a single pipeline.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutionLogRepository {
    entries: Arc<RwLock<HashMap<RunId, Vec<ExecutionLog>>>>,
}

impl InMemoryExecutionLogRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionLogRepository for InMemoryExecutionLogRepository {
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()> {
        let mut entries = self.entries.write().map_err(|err| {
            ExecutionLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        entries.entry(entry.run_id()).or_default().push(entry.clone());
        Ok(())
    }

    async fn list_by_run(
        &self,
        run_id: RunId,
        limit: usize,
    ) -> ExecutionLogRepositoryResult<Vec<ExecutionLog>> {
        let entries = self.entries.read().map_err(|err| {
            ExecutionLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut page: Vec<ExecutionLog> = entries.get(&run_id).cloned().unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps.
        page.sort_by_key(ExecutionLog::timestamp);
        page.truncate(limit);
        Ok(page)
    }
}
