//! `PostgreSQL` integration tests for task and workflow round trips.

use super::helpers::{TestDatabase, test_runtime};
use eyre::{bail, ensure};
use foreman::task::{
    domain::{ProjectId, Task, TaskId, TaskStatus, Workflow, WorkflowStatus},
    ports::{TaskRepository, WorkflowRepository},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn task_status_and_workflow_survive_updates(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_update")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Investigate the 5xx spike"))?;
    let repo = db.tasks();

    let mut started = task.clone();
    started.transition_to(TaskStatus::InProgress, &DefaultClock)?;
    rt.block_on(repo.update(&started))?;

    let Some(found) = rt.block_on(repo.find_by_id(task.id()))? else {
        bail!("task should be stored");
    };
    ensure!(found.status() == TaskStatus::InProgress);
    ensure!(found.title() == "Investigate the 5xx spike");
    ensure!(found.workflow_id() == task.workflow_id());
    ensure!(found.project_id() == task.project_id());
    Ok(())
}

#[rstest]
fn task_description_is_optional(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_description")?;
    let rt = test_runtime()?;
    let repo = db.tasks();
    let described = Task::new(ProjectId::new(), "Document the API", &DefaultClock)?
        .with_description("Cover authentication");
    let bare = Task::new(ProjectId::new(), "Add a health endpoint", &DefaultClock)?;
    rt.block_on(repo.store(&described))?;
    rt.block_on(repo.store(&bare))?;

    let found_described = rt.block_on(repo.find_by_id(described.id()))?;
    let found_bare = rt.block_on(repo.find_by_id(bare.id()))?;

    ensure!(
        found_described.as_ref().and_then(Task::description) == Some("Cover authentication")
    );
    ensure!(found_bare.is_some_and(|task| task.description().is_none() && task.workflow_id().is_none()));
    ensure!(rt.block_on(repo.find_by_id(TaskId::new()))?.is_none());
    Ok(())
}

#[rstest]
fn workflow_round_trips(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "workflow_round_trip")?;
    let rt = test_runtime()?;
    let workflow = Workflow::new(ProjectId::new(), &DefaultClock);
    let repo = db.workflows();

    rt.block_on(repo.store(&workflow))?;

    let Some(found) = rt.block_on(repo.find_by_id(workflow.id()))? else {
        bail!("workflow should be stored");
    };
    ensure!(found.id() == workflow.id());
    ensure!(found.project_id() == workflow.project_id());
    ensure!(found.status() == WorkflowStatus::Active);
    Ok(())
}
