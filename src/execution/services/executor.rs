//! Task execution service.
//!
//! `TaskExecutionService` drives one run through classification, planning,
//! simulated step execution, and completion. Each milestone is appended to
//! the execution log and published to the requesting user's progress
//! channel. Fatal errors inside the pipeline are recorded on the run rather
//! than returned, so a caller awaiting [`TaskExecutionService::execute_task`]
//! always observes a terminal run once the run exists.

use std::sync::Arc;

use mockable::Clock;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cancellation::{CancelRequest, CancellationRegistry, CancellationSignal};
use super::classifier::Classifier;
use super::config::ExecutionConfig;
use super::planner::Planner;
use super::step_runner::StepRunner;
use crate::execution::{
    domain::{
        ExecutionDomainError, ExecutionLog, ProgressEventKind, Run, RunContext, RunId, RunStatus,
        UserId,
    },
    ports::{
        CompletionClient, ExecutionLogRepository, ExecutionLogRepositoryError, ProgressPublisher,
        RunRepository, RunRepositoryError,
    },
};
use crate::task::{
    domain::{Task, TaskDomainError, TaskId, TaskStatus, Workflow, WorkflowId},
    ports::{TaskRepository, TaskRepositoryError, WorkflowRepository, WorkflowRepositoryError},
};

/// Result type for task execution operations.
pub type TaskExecutionResult<T> = Result<T, TaskExecutionError>;

/// Errors returned by [`TaskExecutionService`].
#[derive(Debug, Clone, Error)]
pub enum TaskExecutionError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The run does not exist.
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    /// The run is already writing its completed state and can no longer be
    /// cancelled.
    #[error("run is finishing: {0}")]
    RunFinishing(RunId),

    /// Task state machine rejected an operation.
    #[error(transparent)]
    TaskDomain(#[from] TaskDomainError),

    /// Run state machine rejected an operation.
    #[error(transparent)]
    RunDomain(#[from] ExecutionDomainError),

    /// Task persistence failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// Workflow persistence failed.
    #[error(transparent)]
    WorkflowRepository(#[from] WorkflowRepositoryError),

    /// Run persistence failed.
    #[error(transparent)]
    RunRepository(#[from] RunRepositoryError),

    /// Execution log persistence failed.
    #[error(transparent)]
    LogRepository(#[from] ExecutionLogRepositoryError),
}

/// Persistence ports used by the pipeline.
#[derive(Clone)]
pub struct ExecutionStores {
    /// Task store.
    pub tasks: Arc<dyn TaskRepository>,
    /// Workflow store.
    pub workflows: Arc<dyn WorkflowRepository>,
    /// Run store.
    pub runs: Arc<dyn RunRepository>,
    /// Execution log store.
    pub logs: Arc<dyn ExecutionLogRepository>,
}

enum PipelineOutcome {
    Completed(Run),
    Cancelled,
}

/// Runs tasks through the classify, plan, execute pipeline.
///
/// # Example
///
/// ```ignore
/// let service = TaskExecutionService::new(
///     stores,
///     Arc::new(completion_client),
///     Arc::new(BroadcastProgressHub::new()),
///     Arc::new(DefaultClock),
///     ExecutionConfig::default(),
/// );
///
/// let run = service.execute_task(task_id, user_id).await?;
/// let logs = service.get_logs(run.id(), 100).await?;
/// ```
pub struct TaskExecutionService<M, P, K>
where
    M: CompletionClient,
    P: ProgressPublisher,
    K: Clock + Send + Sync,
{
    stores: ExecutionStores,
    classifier: Classifier<M>,
    planner: Planner<M>,
    step_runner: StepRunner,
    publisher: Arc<P>,
    clock: Arc<K>,
    cancellations: CancellationRegistry,
    config: ExecutionConfig,
}

impl<M, P, K> TaskExecutionService<M, P, K>
where
    M: CompletionClient,
    P: ProgressPublisher,
    K: Clock + Send + Sync,
{
    /// Creates a new execution service.
    #[must_use]
    pub fn new(
        stores: ExecutionStores,
        completion: Arc<M>,
        publisher: Arc<P>,
        clock: Arc<K>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            stores,
            classifier: Classifier::new(Arc::clone(&completion), &config),
            planner: Planner::new(completion, &config),
            step_runner: StepRunner::new(),
            publisher,
            clock,
            cancellations: CancellationRegistry::new(),
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Executes a task to a terminal run state.
    ///
    /// The returned run is `COMPLETED`, `FAILED`, or `CANCELLED`. Pipeline
    /// failures are recorded on the run and reported as `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskExecutionError::TaskNotFound`] for unknown tasks, or a
    /// persistence error raised before the run was stored or while recording
    /// its failure.
    pub async fn execute_task(&self, task_id: TaskId, user_id: UserId) -> TaskExecutionResult<Run> {
        let (task, workflow_id) = self.prepare_task(task_id).await?;

        let run = Run::start(workflow_id, task.id(), &*self.clock);
        let signal = self.cancellations.register(run.id());
        if let Err(err) = self.stores.runs.store(&run).await {
            self.cancellations.release(run.id());
            return Err(err.into());
        }
        let context = RunContext::new(task.id(), run.id(), user_id);
        info!(task_id = %task.id(), run_id = %run.id(), "task execution started");

        let outcome = self.run_pipeline(&task, &run, &context, &signal).await;
        self.cancellations.release(run.id());

        match outcome {
            Ok(PipelineOutcome::Completed(completed)) => Ok(completed),
            Ok(PipelineOutcome::Cancelled) => self.acknowledge_cancellation(&context).await,
            Err(err) => self.fail_run(&task, &run, &context, &err).await,
        }
    }

    /// Starts [`Self::execute_task`] on the tokio runtime without waiting.
    ///
    /// Dropping the handle detaches the execution; it still runs to a
    /// terminal state.
    #[must_use]
    pub fn spawn_execution(
        self: &Arc<Self>,
        task_id: TaskId,
        user_id: UserId,
    ) -> JoinHandle<TaskExecutionResult<Run>>
    where
        M: 'static,
        P: 'static,
        K: 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.execute_task(task_id, user_id).await })
    }

    /// Returns up to `limit` log entries of a run in ascending timestamp
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskExecutionError::LogRepository`] when the read fails.
    pub async fn get_logs(&self, run_id: RunId, limit: usize) -> TaskExecutionResult<Vec<ExecutionLog>> {
        Ok(self.stores.logs.list_by_run(run_id, limit).await?)
    }

    /// Cancels a running run.
    ///
    /// The in-flight pipeline, if any, is signalled first and stops at its
    /// next suspension point; the run is then marked `CANCELLED` in the
    /// store. The task status is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskExecutionError::RunNotFound`] for unknown runs,
    /// [`TaskExecutionError::RunDomain`] when the run already finished,
    /// [`TaskExecutionError::RunFinishing`] when the pipeline is already
    /// writing its completed state, or [`TaskExecutionError::RunRepository`]
    /// when the run failed concurrently.
    pub async fn cancel_task(&self, run_id: RunId) -> TaskExecutionResult<Run> {
        let mut run = self.load_run(run_id).await?;
        run.cancel(&*self.clock)?;

        let request = self.cancellations.cancel(run_id);
        if request == CancelRequest::Committing {
            info!(run_id = %run_id, "cancellation refused, run is finishing");
            return Err(TaskExecutionError::RunFinishing(run_id));
        }

        let cancelled = match self.stores.runs.finish(&run).await {
            Ok(()) => run,
            // The signalled pipeline may have recorded the cancellation first.
            Err(RunRepositoryError::NotRunning(id)) => {
                let stored = self.load_run(run_id).await?;
                if stored.status() != RunStatus::Cancelled {
                    return Err(RunRepositoryError::NotRunning(id).into());
                }
                stored
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            run_id = %run_id,
            task_id = %cancelled.task_id(),
            signalled = request == CancelRequest::Signalled,
            "run cancelled"
        );

        self.append_log(ExecutionLog::info(
            run_id,
            "Task execution cancelled",
            json!({ "status": cancelled.status() }),
            &*self.clock,
        ))
        .await?;
        Ok(cancelled)
    }

    /// Finds a run by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskExecutionError::RunRepository`] when the read fails.
    pub async fn find_run(&self, run_id: RunId) -> TaskExecutionResult<Option<Run>> {
        Ok(self.stores.runs.find_by_id(run_id).await?)
    }

    /// Lists every run of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskExecutionError::RunRepository`] when the read fails.
    pub async fn list_runs(&self, task_id: TaskId) -> TaskExecutionResult<Vec<Run>> {
        Ok(self.stores.runs.list_by_task(task_id).await?)
    }

    async fn prepare_task(&self, task_id: TaskId) -> TaskExecutionResult<(Task, WorkflowId)> {
        let mut task = self
            .stores
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskExecutionError::TaskNotFound(task_id))?;
        let before = task.clone();

        let workflow_id = self.ensure_workflow(&mut task).await?;
        if task.status() == TaskStatus::Pending {
            task.transition_to(TaskStatus::InProgress, &*self.clock)?;
        }
        if task != before {
            self.stores.tasks.update(&task).await?;
        }
        Ok((task, workflow_id))
    }

    async fn ensure_workflow(&self, task: &mut Task) -> TaskExecutionResult<WorkflowId> {
        if let Some(workflow_id) = task.workflow_id() {
            return Ok(workflow_id);
        }

        let workflow = Workflow::new(task.project_id(), &*self.clock);
        self.stores.workflows.store(&workflow).await?;
        task.assign_workflow(workflow.id(), &*self.clock)?;
        debug!(task_id = %task.id(), workflow_id = %workflow.id(), "workflow created for task");
        Ok(workflow.id())
    }

    async fn run_pipeline(
        &self,
        task: &Task,
        run: &Run,
        context: &RunContext,
        signal: &CancellationSignal,
    ) -> TaskExecutionResult<PipelineOutcome> {
        let text = task.brief();

        let Some(category) = signal
            .run_until_cancelled(self.classifier.classify(&text))
            .await
        else {
            return Ok(PipelineOutcome::Cancelled);
        };
        info!(run_id = %run.id(), %category, "task classified");
        self.append_log(ExecutionLog::info(
            run.id(),
            format!("Task classified as: {category}"),
            json!({ "category": category }),
            &*self.clock,
        ))
        .await?;
        self.publish(context, ProgressEventKind::Classified, json!({ "category": category }))
            .await;

        let Some(plan) = signal
            .run_until_cancelled(self.planner.plan(&text, &category))
            .await
        else {
            return Ok(PipelineOutcome::Cancelled);
        };
        let total = plan.len();
        info!(run_id = %run.id(), steps = total, "execution plan created");
        self.append_log(ExecutionLog::info(
            run.id(),
            format!("Execution plan created with {total} steps"),
            json!(plan),
            &*self.clock,
        ))
        .await?;
        self.publish(context, ProgressEventKind::Planned, json!({ "plan": plan }))
            .await;

        for (index, step) in plan.steps().iter().enumerate() {
            let position = index.saturating_add(1);
            let Some(outcome) = self.step_runner.run(step, signal).await else {
                return Ok(PipelineOutcome::Cancelled);
            };
            debug!(run_id = %run.id(), step_id = %step.id(), position, total, "step completed");

            self.append_log(ExecutionLog::info(
                run.id(),
                format!("Step {position}/{total} completed: {}", step.description()),
                json!({ "stepId": step.id(), "tool": step.tool(), "result": outcome }),
                &*self.clock,
            ))
            .await?;
            self.publish(
                context,
                ProgressEventKind::Executing,
                json!({
                    "stepId": step.id(),
                    "description": step.description(),
                    "progress": progress_percent(position, total),
                    "result": outcome,
                }),
            )
            .await;
        }

        if !self.cancellations.begin_commit(run.id()) {
            return Ok(PipelineOutcome::Cancelled);
        }
        self.settle_task(task, TaskStatus::Completed).await?;

        let mut completed = run.clone();
        completed.complete(&*self.clock)?;
        match self.stores.runs.finish(&completed).await {
            Ok(()) => {}
            Err(RunRepositoryError::NotRunning(_)) => return Ok(PipelineOutcome::Cancelled),
            Err(err) => return Err(err.into()),
        }

        info!(
            task_id = %task.id(),
            run_id = %run.id(),
            duration_ms = completed.duration_ms(),
            "task execution completed"
        );
        self.publish(
            context,
            ProgressEventKind::Completed,
            json!({ "duration": completed.duration_ms() }),
        )
        .await;
        Ok(PipelineOutcome::Completed(completed))
    }

    async fn fail_run(
        &self,
        task: &Task,
        run: &Run,
        context: &RunContext,
        cause: &TaskExecutionError,
    ) -> TaskExecutionResult<Run> {
        let message = cause.to_string();
        error!(task_id = %task.id(), run_id = %run.id(), error = %message, "task execution failed");

        let mut failed = run.clone();
        failed.fail(message.clone(), &*self.clock)?;
        match self.stores.runs.finish(&failed).await {
            Ok(()) => {}
            Err(RunRepositoryError::NotRunning(_)) => {
                return self.acknowledge_cancellation(context).await;
            }
            Err(err) => return Err(err.into()),
        }

        if let Err(err) = self
            .append_log(ExecutionLog::error(
                run.id(),
                format!("Task execution failed: {message}"),
                json!({ "error": message }),
                &*self.clock,
            ))
            .await
        {
            warn!(run_id = %run.id(), error = %err, "failure log entry dropped");
        }
        self.publish(context, ProgressEventKind::Failed, json!({ "error": message }))
            .await;
        if let Err(err) = self.settle_task(task, TaskStatus::Failed).await {
            warn!(task_id = %task.id(), error = %err, "task could not be marked failed");
        }
        Ok(failed)
    }

    async fn acknowledge_cancellation(&self, context: &RunContext) -> TaskExecutionResult<Run> {
        let mut run = self.load_run(context.run_id).await?;
        if run.status() == RunStatus::Running {
            run.cancel(&*self.clock)?;
            match self.stores.runs.finish(&run).await {
                Ok(()) => {}
                Err(RunRepositoryError::NotRunning(_)) => {
                    run = self.load_run(context.run_id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        info!(task_id = %context.task_id, run_id = %context.run_id, "pipeline stopped after cancellation");
        self.publish(context, ProgressEventKind::Cancelled, json!({ "status": run.status() }))
            .await;
        Ok(run)
    }

    async fn load_run(&self, run_id: RunId) -> TaskExecutionResult<Run> {
        self.stores
            .runs
            .find_by_id(run_id)
            .await?
            .ok_or(TaskExecutionError::RunNotFound(run_id))
    }

    /// Moves the task to `target` unless it already reached a terminal state.
    async fn settle_task(&self, task: &Task, target: TaskStatus) -> TaskExecutionResult<()> {
        if !task.status().can_transition_to(target) {
            debug!(task_id = %task.id(), status = %task.status(), %target, "task status left as is");
            return Ok(());
        }
        let mut settled = task.clone();
        settled.transition_to(target, &*self.clock)?;
        self.stores.tasks.update(&settled).await?;
        Ok(())
    }

    async fn append_log(&self, entry: ExecutionLog) -> TaskExecutionResult<()> {
        self.stores.logs.append(&entry).await?;
        Ok(())
    }

    async fn publish(&self, context: &RunContext, kind: ProgressEventKind, payload: Value) {
        let event = context.event(kind, payload, &*self.clock);
        if let Err(err) = self.publisher.publish(&context.channel(), &event).await {
            warn!(run_id = %context.run_id, event = %kind, error = %err, "progress event dropped");
        }
    }
}

fn progress_percent(position: usize, total: usize) -> usize {
    position
        .saturating_mul(100)
        .checked_div(total)
        .unwrap_or(100)
}
