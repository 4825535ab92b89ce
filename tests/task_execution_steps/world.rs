//! Shared world state for task execution BDD scenarios.

use async_trait::async_trait;
use foreman::execution::{
    adapters::{
        BroadcastProgressHub,
        memory::{InMemoryExecutionLogRepository, InMemoryRunRepository, ScriptedCompletionClient},
    },
    domain::{ExecutionLog, ProgressEvent, Run, RunId, UserId},
    ports::{
        ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult,
        RunRepository,
    },
    services::{ExecutionConfig, ExecutionStores, TaskExecutionError, TaskExecutionService},
};
use foreman::task::{
    adapters::memory::{InMemoryTaskRepository, InMemoryWorkflowRepository},
    domain::Task,
    ports::{TaskRepository, WorkflowRepository},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

/// Service type exercised by the scenarios.
pub type ScenarioService =
    TaskExecutionService<ScriptedCompletionClient, BroadcastProgressHub, DefaultClock>;

/// Scenario world for task execution behaviour tests.
pub struct TaskExecutionWorld {
    pub completion: ScriptedCompletionClient,
    pub tasks: Arc<dyn TaskRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub runs: Arc<dyn RunRepository>,
    pub logs: Arc<dyn ExecutionLogRepository>,
    pub hub: Arc<BroadcastProgressHub>,
    pub user_id: UserId,
    pub task: Option<Task>,
    pub run: Option<Run>,
    pub events: Vec<ProgressEvent>,
    pub execution_error: Option<TaskExecutionError>,
}

impl TaskExecutionWorld {
    /// Creates a world backed by empty in-memory stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            completion: ScriptedCompletionClient::new(),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            workflows: Arc::new(InMemoryWorkflowRepository::new()),
            runs: Arc::new(InMemoryRunRepository::new()),
            logs: Arc::new(InMemoryExecutionLogRepository::new()),
            hub: Arc::new(BroadcastProgressHub::new()),
            user_id: UserId::new(),
            task: None,
            run: None,
            events: Vec::new(),
            execution_error: None,
        }
    }

    /// Builds a service over the world's stores with millisecond step
    /// defaults.
    #[must_use]
    pub fn service(&self) -> Arc<ScenarioService> {
        let stores = ExecutionStores {
            tasks: Arc::clone(&self.tasks),
            workflows: Arc::clone(&self.workflows),
            runs: Arc::clone(&self.runs),
            logs: Arc::clone(&self.logs),
        };
        let config = ExecutionConfig::default()
            .with_default_step_duration(Duration::from_millis(1))
            .with_fallback_step_duration(Duration::from_millis(1));
        Arc::new(TaskExecutionService::new(
            stores,
            Arc::new(self.completion.clone()),
            Arc::clone(&self.hub),
            Arc::new(DefaultClock),
            config,
        ))
    }

    /// Returns the run recorded by the last `When` step.
    ///
    /// # Errors
    ///
    /// Returns an error when no run was recorded.
    pub fn recorded_run(&self) -> Result<&Run, eyre::Report> {
        self.run
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing run in scenario world"))
    }
}

impl Default for TaskExecutionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskExecutionWorld {
    TaskExecutionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Log store that rejects every write.
#[derive(Debug, Default)]
pub struct UnavailableLogRepository;

#[async_trait]
impl ExecutionLogRepository for UnavailableLogRepository {
    async fn append(&self, _entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()> {
        Err(ExecutionLogRepositoryError::persistence(std::io::Error::other(
            "log store unavailable",
        )))
    }

    async fn list_by_run(
        &self,
        _run_id: RunId,
        _limit: usize,
    ) -> ExecutionLogRepositoryResult<Vec<ExecutionLog>> {
        Ok(Vec::new())
    }
}
