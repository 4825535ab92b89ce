//! Shared test helpers for in-memory pipeline integration tests.

use foreman::execution::{
    adapters::{
        BroadcastProgressHub,
        memory::{InMemoryExecutionLogRepository, InMemoryRunRepository, ScriptedCompletionClient},
    },
    domain::{ProgressEvent, ProgressEventKind, UserId},
    services::{ExecutionConfig, ExecutionStores, TaskExecutionService},
};
use foreman::task::{
    adapters::memory::{InMemoryTaskRepository, InMemoryWorkflowRepository},
    domain::{ProjectId, Task},
    ports::TaskRepository,
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

/// Pipeline service wired to in-memory adapters.
pub type InMemoryService =
    TaskExecutionService<ScriptedCompletionClient, BroadcastProgressHub, DefaultClock>;

/// Service plus the handles tests inspect.
pub struct Pipeline {
    /// Service under test.
    pub service: Arc<InMemoryService>,
    /// Scripted model shared with the service.
    pub completion: ScriptedCompletionClient,
    /// Progress hub shared with the service.
    pub hub: Arc<BroadcastProgressHub>,
    /// Task store shared with the service.
    pub tasks: Arc<dyn TaskRepository>,
}

impl Pipeline {
    /// Creates a task, optionally with a description, and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is invalid or cannot be stored.
    pub async fn store_task(&self, title: &str, description: Option<&str>) -> eyre::Result<Task> {
        let mut task = Task::new(ProjectId::new(), title, &DefaultClock)?;
        if let Some(text) = description {
            task = task.with_description(text);
        }
        self.tasks.store(&task).await.wrap_err("store task")?;
        Ok(task)
    }

    /// Reads the stored version of `task`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the task vanished.
    pub async fn reload(&self, task: &Task) -> eyre::Result<Task> {
        self.tasks
            .find_by_id(task.id())
            .await?
            .ok_or_else(|| eyre::eyre!("task {} should exist", task.id()))
    }

    /// Subscribes to the channel of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub rejects the subscription.
    pub fn subscribe(&self, user_id: UserId) -> eyre::Result<Receiver<ProgressEvent>> {
        Ok(self.hub.subscribe(user_id)?)
    }
}

/// Builds a pipeline that replays `completion` with millisecond defaults.
#[must_use]
pub fn pipeline(completion: ScriptedCompletionClient) -> Pipeline {
    let tasks: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
    let stores = ExecutionStores {
        tasks: Arc::clone(&tasks),
        workflows: Arc::new(InMemoryWorkflowRepository::new()),
        runs: Arc::new(InMemoryRunRepository::new()),
        logs: Arc::new(InMemoryExecutionLogRepository::new()),
    };
    let hub = Arc::new(BroadcastProgressHub::new());
    let config = ExecutionConfig::default()
        .with_default_step_duration(Duration::from_millis(1))
        .with_fallback_step_duration(Duration::from_millis(1));
    let service = TaskExecutionService::new(
        stores,
        Arc::new(completion.clone()),
        Arc::clone(&hub),
        Arc::new(DefaultClock),
        config,
    );

    Pipeline {
        service: Arc::new(service),
        completion,
        hub,
        tasks,
    }
}

/// Provides a fresh user for each test.
#[fixture]
pub fn user_id() -> UserId {
    UserId::new()
}

/// Builds planner output with one step per `(description, tool, millis)`.
#[must_use]
pub fn plan_json(steps: &[(&str, &str, u64)]) -> String {
    let entries: Vec<Value> = steps
        .iter()
        .enumerate()
        .map(|(index, (description, tool, millis))| {
            json!({
                "id": format!("s{}", index.saturating_add(1)),
                "description": description,
                "tool": tool,
                "estimatedDuration": millis,
            })
        })
        .collect();
    json!({ "steps": entries, "requiredTools": [] }).to_string()
}

/// Collects every event already buffered on `receiver`.
pub fn drain(receiver: &mut Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

/// Returns the event names in order.
#[must_use]
pub fn kinds(events: &[ProgressEvent]) -> Vec<ProgressEventKind> {
    events.iter().map(|event| event.kind).collect()
}

/// Waits up to five seconds for the next event of `kind`.
///
/// # Errors
///
/// Returns an error on timeout or when the channel closes.
pub async fn wait_for(
    receiver: &mut Receiver<ProgressEvent>,
    kind: ProgressEventKind,
) -> eyre::Result<ProgressEvent> {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .wrap_err_with(|| format!("timed out waiting for {kind}"))??;
        if event.kind == kind {
            return Ok(event);
        }
    }
}
