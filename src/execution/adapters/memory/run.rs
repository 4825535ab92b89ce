//! In-memory repository for runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::execution::{
    domain::{Run, RunId},
    ports::{RunRepository, RunRepositoryError, RunRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory run repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunRepository {
    state: Arc<RwLock<InMemoryRunState>>,
}

#[derive(Debug, Default)]
struct InMemoryRunState {
    runs: HashMap<RunId, Run>,
    task_index: HashMap<TaskId, Vec<RunId>>,
}

impl InMemoryRunRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> RunRepositoryError {
    RunRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn store(&self, run: &Run) -> RunRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.runs.contains_key(&run.id()) {
            return Err(RunRepositoryError::DuplicateRun(run.id()));
        }
        state
            .task_index
            .entry(run.task_id())
            .or_default()
            .push(run.id());
        state.runs.insert(run.id(), run.clone());
        Ok(())
    }

    async fn finish(&self, run: &Run) -> RunRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .runs
            .get_mut(&run.id())
            .ok_or(RunRepositoryError::NotFound(run.id()))?;
        if stored.status().is_terminal() {
            return Err(RunRepositoryError::NotRunning(run.id()));
        }
        *stored = run.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: RunId) -> RunRepositoryResult<Option<Run>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.runs.get(&id).cloned())
    }

    async fn list_by_task(&self, task_id: TaskId) -> RunRepositoryResult<Vec<Run>> {
        let state = self.state.read().map_err(lock_error)?;
        let runs = state
            .task_index
            .get(&task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.runs.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(runs)
    }
}
