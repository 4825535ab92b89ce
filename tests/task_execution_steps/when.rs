//! When steps for task execution BDD scenarios.

use super::world::{TaskExecutionWorld, run_async};
use eyre::WrapErr;
use foreman::execution::domain::{ProgressEvent, ProgressEventKind};
use foreman::task::domain::TaskId;
use rstest_bdd_macros::when;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

fn drain(receiver: &mut Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

#[when("the task is executed")]
fn task_is_executed(world: &mut TaskExecutionWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task
        .as_ref()
        .map(foreman::task::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let mut receiver = world.hub.subscribe(world.user_id)?;
    let service = world.service();

    let run = run_async(service.execute_task(task_id, world.user_id))
        .wrap_err("execute scenario task")?;

    world.events = drain(&mut receiver);
    world.run = Some(run);
    Ok(())
}

#[when("the task is executed in the background and cancelled after planning")]
fn task_is_cancelled_after_planning(world: &mut TaskExecutionWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task
        .as_ref()
        .map(foreman::task::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let mut receiver = world.hub.subscribe(world.user_id)?;
    let service = world.service();
    let user_id = world.user_id;

    let (events, run) = run_async(async move {
        let handle = service.spawn_execution(task_id, user_id);
        let mut seen = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
                .await
                .wrap_err("timed out waiting for the plan")??;
            let kind = event.kind;
            seen.push(event);
            if kind == ProgressEventKind::Planned {
                break;
            }
        }
        let run_id = seen
            .last()
            .map(|event| event.run_id)
            .ok_or_else(|| eyre::eyre!("no events received"))?;
        service.cancel_task(run_id).await?;
        let run = tokio::time::timeout(Duration::from_secs(5), handle).await???;
        seen.extend(drain(&mut receiver));
        Ok::<_, eyre::Report>((seen, run))
    })?;

    world.events = events;
    world.run = Some(run);
    Ok(())
}

#[when("an unknown task is executed")]
fn unknown_task_is_executed(world: &mut TaskExecutionWorld) {
    let service = world.service();
    world.execution_error = run_async(service.execute_task(TaskId::new(), world.user_id)).err();
}
