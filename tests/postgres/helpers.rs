//! Shared test helpers for `PostgreSQL` integration tests.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use foreman::execution::{
    adapters::postgres::{PostgresExecutionLogRepository, PostgresRunRepository},
    domain::{PersistedRunData, Run, RunId, RunStatus},
};
use foreman::task::{
    adapters::postgres::{PostgresTaskRepository, PostgresWorkflowRepository, TaskPgPool},
    domain::{ProjectId, Task, Workflow},
    ports::{TaskRepository, WorkflowRepository},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the workflow, task, run, and execution log tables.
pub const CREATE_EXECUTION_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_execution_tables/up.sql");

/// Template database name for pre-migrated schema.
pub const TEMPLATE_DB: &str = "foreman_test_template";

/// Creates a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn test_runtime() -> eyre::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_EXECUTION_TABLES_SQL).map_err(Into::into)
        })
        .map_err(|err| eyre::eyre!("template setup failed: {err}"))
}

/// Executes a migration script one statement at a time.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Per-test database cloned from the template and dropped afterwards.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    db_name: String,
    pool: TaskPgPool,
}

impl TestDatabase {
    /// Creates a fresh database from the migrated template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template, the database, or the pool cannot be
    /// created.
    pub fn create(cluster: &'static TestCluster, prefix: &str) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let db_name = format!("{prefix}_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
            .map_err(|err| eyre::eyre!("create {db_name}: {err}"))?;

        let manager = ConnectionManager::<PgConnection>::new(cluster.connection().database_url(&db_name));
        // One connection keeps statement order deterministic.
        let built = Pool::builder().max_size(1).build(manager);
        let pool = match built {
            Ok(pool) => pool,
            Err(err) => {
                drop(cluster.drop_database(db_name.as_str()));
                return Err(err.into());
            }
        };
        Ok(Self {
            cluster,
            db_name,
            pool,
        })
    }

    /// Returns a task repository bound to this database.
    #[must_use]
    pub fn tasks(&self) -> PostgresTaskRepository {
        PostgresTaskRepository::new(self.pool.clone())
    }

    /// Returns a workflow repository bound to this database.
    #[must_use]
    pub fn workflows(&self) -> PostgresWorkflowRepository {
        PostgresWorkflowRepository::new(self.pool.clone())
    }

    /// Returns a run repository bound to this database.
    #[must_use]
    pub fn runs(&self) -> PostgresRunRepository {
        PostgresRunRepository::new(self.pool.clone())
    }

    /// Returns an execution log repository bound to this database.
    #[must_use]
    pub fn logs(&self) -> PostgresExecutionLogRepository {
        PostgresExecutionLogRepository::new(self.pool.clone())
    }

    /// Stores a workflow and a task attached to it, satisfying the run
    /// foreign keys.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub async fn seed_task(&self, title: &str) -> eyre::Result<Task> {
        let project_id = ProjectId::new();
        let workflow = Workflow::new(project_id, &DefaultClock);
        self.workflows().store(&workflow).await?;

        let mut task = Task::new(project_id, title, &DefaultClock)?;
        task.assign_workflow(workflow.id(), &DefaultClock)?;
        self.tasks().store(&task).await?;
        Ok(task)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(self.db_name.as_str()));
    }
}

/// Returns a whole-second timestamp that survives microsecond storage.
#[must_use]
pub fn fixed_time(offset_secs: i64) -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + Duration::days(20_454) + Duration::seconds(offset_secs)
}

/// Builds a running run for `task` starting at `started_at`.
///
/// # Errors
///
/// Returns an error if the task has no workflow.
pub fn running_run(task: &Task, started_at: DateTime<Utc>) -> eyre::Result<Run> {
    let workflow_id = task
        .workflow_id()
        .ok_or_else(|| eyre::eyre!("seeded task should carry a workflow"))?;
    Ok(Run::from_persisted(PersistedRunData {
        id: RunId::new(),
        workflow_id,
        task_id: task.id(),
        status: RunStatus::Running,
        started_at,
        completed_at: None,
        duration_ms: None,
        error: None,
    }))
}
