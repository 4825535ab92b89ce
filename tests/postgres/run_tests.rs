//! `PostgreSQL` integration tests for run storage and terminal writes.

use super::helpers::{TestDatabase, fixed_time, running_run, test_runtime};
use eyre::{bail, ensure};
use foreman::execution::{
    domain::{RunId, RunStatus},
    ports::{RunRepository, RunRepositoryError},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn stored_run_round_trips(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_round_trip")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Provision a staging server"))?;
    let run = running_run(&task, fixed_time(0))?;
    let repo = db.runs();

    rt.block_on(repo.store(&run))?;
    let found = rt.block_on(repo.find_by_id(run.id()))?;

    ensure!(found.as_ref() == Some(&run));
    Ok(())
}

#[rstest]
fn second_terminal_write_is_rejected(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_cas")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Nightly cleanup"))?;
    let run = running_run(&task, fixed_time(0))?;
    let repo = db.runs();
    rt.block_on(repo.store(&run))?;

    let mut cancelled = run.clone();
    cancelled.cancel(&DefaultClock)?;
    rt.block_on(repo.finish(&cancelled))?;

    let mut completed = run.clone();
    completed.complete(&DefaultClock)?;
    let late = rt.block_on(repo.finish(&completed));

    ensure!(matches!(late, Err(RunRepositoryError::NotRunning(id)) if id == run.id()));
    let Some(stored) = rt.block_on(repo.find_by_id(run.id()))? else {
        bail!("run should still be stored");
    };
    ensure!(stored.status() == RunStatus::Cancelled);
    ensure!(stored.duration_ms() == cancelled.duration_ms());
    ensure!(stored.completed_at().is_some());
    Ok(())
}

#[rstest]
fn failed_run_keeps_its_error(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_failed")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Rotate the API keys"))?;
    let run = running_run(&task, fixed_time(0))?;
    let repo = db.runs();
    rt.block_on(repo.store(&run))?;

    let mut failed = run.clone();
    failed.fail("persistence error: log store unavailable", &DefaultClock)?;
    rt.block_on(repo.finish(&failed))?;

    let Some(stored) = rt.block_on(repo.find_by_id(run.id()))? else {
        bail!("run should still be stored");
    };
    ensure!(stored.status() == RunStatus::Failed);
    ensure!(stored.error() == Some("persistence error: log store unavailable"));
    Ok(())
}

#[rstest]
fn finishing_an_unknown_run_is_not_found(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_unknown")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Never stored"))?;
    let mut ghost = running_run(&task, fixed_time(0))?;
    ghost.complete(&DefaultClock)?;

    let result = rt.block_on(db.runs().finish(&ghost));

    ensure!(matches!(result, Err(RunRepositoryError::NotFound(id)) if id == ghost.id()));
    ensure!(rt.block_on(db.runs().find_by_id(RunId::new()))?.is_none());
    Ok(())
}

#[rstest]
fn duplicate_run_is_rejected(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_duplicate")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Deploy twice"))?;
    let run = running_run(&task, fixed_time(0))?;
    let repo = db.runs();
    rt.block_on(repo.store(&run))?;

    let again = rt.block_on(repo.store(&run));

    ensure!(matches!(again, Err(RunRepositoryError::DuplicateRun(id)) if id == run.id()));
    Ok(())
}

#[rstest]
fn runs_of_a_task_are_listed_by_start_time(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "run_listing")?;
    let rt = test_runtime()?;
    let task = rt.block_on(db.seed_task("Tidy the codebase"))?;
    let other = rt.block_on(db.seed_task("Unrelated work"))?;
    let later = running_run(&task, fixed_time(60))?;
    let earlier = running_run(&task, fixed_time(0))?;
    let foreign = running_run(&other, fixed_time(30))?;
    let repo = db.runs();
    for run in [&later, &earlier, &foreign] {
        rt.block_on(repo.store(run))?;
    }

    let listed = rt.block_on(repo.list_by_task(task.id()))?;

    let ids: Vec<RunId> = listed.iter().map(foreman::execution::domain::Run::id).collect();
    ensure!(ids == [earlier.id(), later.id()]);
    Ok(())
}
