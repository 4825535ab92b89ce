//! Runs one task through the execution pipeline from the command line.
//!
//! Usage:
//!
//! ```text
//! foreman "Provision a staging server" --description "Ubuntu, 2 vCPU"
//! ```
//!
//! The language model endpoint is read from `LLM_API_URL`, `LLM_API_KEY`,
//! `LLM_MODEL`, `LLM_PROVIDER`, and `LLM_TIMEOUT_SECS`. Tasks, runs, and
//! logs live in memory for the lifetime of the process. Progress events and
//! the final run logs are emitted through `tracing`; set `RUST_LOG` to
//! adjust verbosity.

use clap::Parser;
use foreman::execution::{
    adapters::{
        BroadcastProgressHub,
        http::HttpCompletionClient,
        memory::{InMemoryExecutionLogRepository, InMemoryRunRepository},
    },
    domain::UserId,
    services::{ExecutionConfig, ExecutionStores, TaskExecutionService},
};
use foreman::task::{
    adapters::memory::{InMemoryTaskRepository, InMemoryWorkflowRepository},
    domain::{ProjectId, Task},
    ports::TaskRepository,
};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "foreman", about = "Classify, plan, and execute a task")]
struct Args {
    /// Task title.
    title: String,

    /// Optional task description appended to the title.
    #[arg(long)]
    description: Option<String>,

    /// User the progress events are addressed to.
    #[arg(long, env = "FOREMAN_USER")]
    user: Option<Uuid>,

    /// Maximum number of log entries printed after the run.
    #[arg(long, default_value_t = 100)]
    log_limit: usize,
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<(), BoxError> {
    let completion = HttpCompletionClient::from_env()?;
    info!(
        provider = ?completion.config().provider,
        model = %completion.config().model,
        "language model configured"
    );

    let tasks: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
    let stores = ExecutionStores {
        tasks: Arc::clone(&tasks),
        workflows: Arc::new(InMemoryWorkflowRepository::new()),
        runs: Arc::new(InMemoryRunRepository::new()),
        logs: Arc::new(InMemoryExecutionLogRepository::new()),
    };

    let mut task = Task::new(ProjectId::new(), args.title, &DefaultClock)?;
    if let Some(description) = args.description {
        task = task.with_description(description);
    }
    tasks.store(&task).await?;

    let user_id = args.user.map_or_else(UserId::new, UserId::from_uuid);
    let hub = Arc::new(BroadcastProgressHub::new());
    let mut receiver = hub.subscribe(user_id)?;
    let listener = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(
                    event = %event.kind,
                    run_id = %event.run_id,
                    payload = %event.payload,
                    "progress"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "progress listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let service = TaskExecutionService::new(
        stores,
        Arc::new(completion),
        Arc::clone(&hub),
        Arc::new(DefaultClock),
        ExecutionConfig::default(),
    );

    let outcome = service.execute_task(task.id(), user_id).await?;
    info!(
        run_id = %outcome.id(),
        status = %outcome.status(),
        duration_ms = ?outcome.duration_ms(),
        error = ?outcome.error(),
        "run finished"
    );

    for entry in service.get_logs(outcome.id(), args.log_limit).await? {
        info!(
            level = %entry.level(),
            timestamp = %entry.timestamp(),
            data = %entry.data(),
            "{}",
            entry.message()
        );
    }

    drop(service);
    drop(hub);
    listener.await?;
    Ok(())
}
