//! Cancelling runs through the public service API.

use super::helpers::{drain, kinds, pipeline, plan_json, user_id, wait_for};
use eyre::{WrapErr, ensure};
use foreman::execution::{
    adapters::memory::ScriptedCompletionClient,
    domain::{ProgressEventKind, RunStatus, UserId},
    services::TaskExecutionError,
};
use foreman::task::domain::TaskStatus;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_mid_step_records_a_cancelled_run(user_id: UserId) -> eyre::Result<()> {
    let harness = pipeline(
        ScriptedCompletionClient::new()
            .then_answer("SCRAPE")
            .then_answer(plan_json(&[
                ("Fetch the index page", "http", 1),
                ("Crawl every product page", "http", 60_000),
            ])),
    );
    let task = harness.store_task("Scrape the catalogue", None).await?;
    let mut receiver = harness.subscribe(user_id)?;

    let handle = harness.service.spawn_execution(task.id(), user_id);
    let first_step = wait_for(&mut receiver, ProgressEventKind::Executing).await?;
    ensure!(first_step.payload["progress"] == json!(50));

    let cancelled = harness.service.cancel_task(first_step.run_id).await?;
    let finished = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .wrap_err("pipeline should stop promptly after cancellation")???;

    ensure!(cancelled.status() == RunStatus::Cancelled);
    ensure!(cancelled.completed_at().is_some());
    ensure!(finished.status() == RunStatus::Cancelled);
    ensure!(kinds(&drain(&mut receiver)) == [ProgressEventKind::Cancelled]);

    let logs = harness.service.get_logs(first_step.run_id, 100).await?;
    let last = logs.last().ok_or_else(|| eyre::eyre!("cancellation should be logged"))?;
    ensure!(last.message() == "Task execution cancelled");
    ensure!(last.data() == &json!({ "status": "CANCELLED" }));
    ensure!(logs.len() == 4);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_task_can_be_executed_again(user_id: UserId) -> eyre::Result<()> {
    let harness = pipeline(
        ScriptedCompletionClient::new()
            .then_answer("DEPLOY")
            .then_answer(plan_json(&[("Wait for the release window", "exec", 60_000)]))
            .then_answer("DEPLOY")
            .then_answer(plan_json(&[("Roll out", "docker", 1)])),
    );
    let task = harness.store_task("Ship release 2.4", None).await?;
    let mut receiver = harness.subscribe(user_id)?;

    let handle = harness.service.spawn_execution(task.id(), user_id);
    let planned = wait_for(&mut receiver, ProgressEventKind::Planned).await?;
    harness.service.cancel_task(planned.run_id).await?;
    tokio::time::timeout(Duration::from_secs(5), handle).await???;
    ensure!(harness.reload(&task).await?.status() == TaskStatus::InProgress);

    let retry = harness.service.execute_task(task.id(), user_id).await?;

    ensure!(retry.status() == RunStatus::Completed);
    ensure!(harness.reload(&task).await?.status() == TaskStatus::Completed);
    let statuses: Vec<_> = harness
        .service
        .list_runs(task.id())
        .await?
        .iter()
        .map(foreman::execution::domain::Run::status)
        .collect();
    ensure!(statuses == [RunStatus::Cancelled, RunStatus::Completed]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_run_cannot_be_cancelled_twice(user_id: UserId) -> eyre::Result<()> {
    let harness = pipeline(
        ScriptedCompletionClient::new()
            .then_answer("SECURITY")
            .then_answer(plan_json(&[("Run the full audit", "security", 60_000)])),
    );
    let task = harness.store_task("Audit the firewall rules", None).await?;
    let mut receiver = harness.subscribe(user_id)?;

    let handle = harness.service.spawn_execution(task.id(), user_id);
    let planned = wait_for(&mut receiver, ProgressEventKind::Planned).await?;
    harness.service.cancel_task(planned.run_id).await?;
    let second = harness.service.cancel_task(planned.run_id).await;
    tokio::time::timeout(Duration::from_secs(5), handle).await???;

    ensure!(matches!(second, Err(TaskExecutionError::RunDomain(_))));
    let cancellation_logs = harness
        .service
        .get_logs(planned.run_id, 100)
        .await?
        .iter()
        .filter(|entry| entry.message() == "Task execution cancelled")
        .count();
    ensure!(cancellation_logs == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_users_do_not_see_progress(user_id: UserId) -> eyre::Result<()> {
    let harness = pipeline(
        ScriptedCompletionClient::new()
            .then_answer("CODE")
            .then_answer(plan_json(&[("Add the endpoint", "exec", 1)])),
    );
    let task = harness.store_task("Add a health endpoint", None).await?;
    let mut bystander = harness.subscribe(UserId::new())?;

    harness.service.execute_task(task.id(), user_id).await?;

    ensure!(drain(&mut bystander).is_empty());
    Ok(())
}
