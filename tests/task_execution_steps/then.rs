//! Then steps for task execution BDD scenarios.

use super::world::{TaskExecutionWorld, run_async};
use foreman::execution::{domain::RunStatus, services::TaskExecutionError};
use foreman::task::domain::TaskStatus;
use rstest_bdd_macros::then;
use serde_json::json;

#[then(r#"the run status is "{status}""#)]
fn run_status_is(world: &TaskExecutionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = RunStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected run status in scenario: {err}"))?;
    let run = world.recorded_run()?;

    let stored = run_async(world.runs.find_by_id(run.id()))?
        .ok_or_else(|| eyre::eyre!("run {} was not persisted", run.id()))?;
    if run.status() != expected || stored.status() != expected {
        return Err(eyre::eyre!(
            "expected run status {expected}, returned {}, stored {}",
            run.status(),
            stored.status()
        ));
    }
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskExecutionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected task status in scenario: {err}"))?;
    let task_id = world
        .task
        .as_ref()
        .map(foreman::task::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;

    let stored = run_async(world.tasks.find_by_id(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} was not persisted"))?;
    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected task status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

#[then(r#"the progress events are "{names}""#)]
fn progress_events_are(world: &TaskExecutionWorld, names: String) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = names.split(',').map(str::trim).collect();
    let actual: Vec<&str> = world.events.iter().map(|event| event.kind.as_str()).collect();
    if actual != expected {
        return Err(eyre::eyre!("expected events {expected:?}, got {actual:?}"));
    }
    Ok(())
}

#[then(r#"the classified event carries category "{category}""#)]
fn classified_event_category(
    world: &TaskExecutionWorld,
    category: String,
) -> Result<(), eyre::Report> {
    let event = world
        .events
        .first()
        .ok_or_else(|| eyre::eyre!("no progress events recorded"))?;
    if event.payload != json!({ "category": category }) {
        return Err(eyre::eyre!(
            "expected category {category}, got payload {}",
            event.payload
        ));
    }
    Ok(())
}

#[then("the run has {count:u64} log entries")]
fn run_has_log_entries(world: &TaskExecutionWorld, count: u64) -> Result<(), eyre::Report> {
    let run = world.recorded_run()?;
    let entries = run_async(world.logs.list_by_run(run.id(), 100))?;
    let actual = u64::try_from(entries.len())?;
    if actual != count {
        return Err(eyre::eyre!("expected {count} log entries, found {actual}"));
    }
    Ok(())
}

#[then(r#"the run error mentions "{text}""#)]
fn run_error_mentions(world: &TaskExecutionWorld, text: String) -> Result<(), eyre::Report> {
    let run = world.recorded_run()?;
    match run.error() {
        Some(message) if message.contains(&text) => Ok(()),
        other => Err(eyre::eyre!("expected run error mentioning {text:?}, got {other:?}")),
    }
}

#[then("execution fails because the task does not exist")]
fn execution_fails_task_not_found(world: &TaskExecutionWorld) -> Result<(), eyre::Report> {
    match &world.execution_error {
        Some(TaskExecutionError::TaskNotFound(_)) => Ok(()),
        other => Err(eyre::eyre!("expected TaskNotFound, got {other:?}")),
    }
}
