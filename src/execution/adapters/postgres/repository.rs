//! `PostgreSQL` repository implementations for runs and execution logs.

use super::{
    models::{ExecutionLogRow, NewExecutionLogRow, NewRunRow, RunFinishChangeset, RunRow},
    schema::{execution_logs, runs},
};
use crate::execution::{
    domain::{
        ExecutionLog, LogId, LogLevel, PersistedLogData, PersistedRunData, Run, RunId, RunStatus,
    },
    ports::{
        ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult,
        RunRepository, RunRepositoryError, RunRepositoryResult,
    },
};
use crate::task::adapters::postgres::TaskPgPool;
use crate::task::domain::{TaskId, WorkflowId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed run repository.
#[derive(Debug, Clone)]
pub struct PostgresRunRepository {
    pool: TaskPgPool,
}

impl PostgresRunRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RunRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RunRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RunRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RunRepositoryError::persistence)?
    }
}

#[async_trait]
impl RunRepository for PostgresRunRepository {
    async fn store(&self, run: &Run) -> RunRepositoryResult<()> {
        let run_id = run.id();
        let new_row = to_new_run_row(run);

        self.run_blocking(move |connection| {
            diesel::insert_into(runs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RunRepositoryError::DuplicateRun(run_id)
                    }
                    other => RunRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn finish(&self, run: &Run) -> RunRepositoryResult<()> {
        let run_id = run.id();
        let changeset = RunFinishChangeset {
            status: run.status().as_str().to_owned(),
            completed_at: run.completed_at(),
            duration_ms: run.duration_ms().map(duration_to_column),
            error: run.error().map(str::to_owned),
        };

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                runs::table
                    .filter(runs::id.eq(run_id.into_inner()))
                    .filter(runs::status.eq(RunStatus::Running.as_str())),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(RunRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }

            let exists = runs::table
                .find(run_id.into_inner())
                .select(runs::id)
                .first::<uuid::Uuid>(connection)
                .optional()
                .map_err(RunRepositoryError::persistence)?
                .is_some();
            if exists {
                Err(RunRepositoryError::NotRunning(run_id))
            } else {
                Err(RunRepositoryError::NotFound(run_id))
            }
        })
        .await
    }

    async fn find_by_id(&self, id: RunId) -> RunRepositoryResult<Option<Run>> {
        self.run_blocking(move |connection| {
            let row = runs::table
                .find(id.into_inner())
                .select(RunRow::as_select())
                .first::<RunRow>(connection)
                .optional()
                .map_err(RunRepositoryError::persistence)?;
            row.map(row_to_run).transpose()
        })
        .await
    }

    async fn list_by_task(&self, task_id: TaskId) -> RunRepositoryResult<Vec<Run>> {
        self.run_blocking(move |connection| {
            let rows = runs::table
                .filter(runs::task_id.eq(task_id.into_inner()))
                .order(runs::started_at.asc())
                .select(RunRow::as_select())
                .load::<RunRow>(connection)
                .map_err(RunRepositoryError::persistence)?;
            rows.into_iter().map(row_to_run).collect()
        })
        .await
    }
}

/// `PostgreSQL`-backed execution log repository.
#[derive(Debug, Clone)]
pub struct PostgresExecutionLogRepository {
    pool: TaskPgPool,
}

impl PostgresExecutionLogRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ExecutionLogRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ExecutionLogRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(ExecutionLogRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ExecutionLogRepositoryError::persistence)?
    }
}

#[async_trait]
impl ExecutionLogRepository for PostgresExecutionLogRepository {
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()> {
        let new_row = NewExecutionLogRow {
            id: entry.id().into_inner(),
            run_id: entry.run_id().into_inner(),
            level: entry.level().as_str().to_owned(),
            message: entry.message().to_owned(),
            data: entry.data().clone(),
            timestamp: entry.timestamp(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(execution_logs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(ExecutionLogRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_by_run(
        &self,
        run_id: RunId,
        limit: usize,
    ) -> ExecutionLogRepositoryResult<Vec<ExecutionLog>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.run_blocking(move |connection| {
            let rows = execution_logs::table
                .filter(execution_logs::run_id.eq(run_id.into_inner()))
                .order((
                    execution_logs::timestamp.asc(),
                    execution_logs::sequence.asc(),
                ))
                .limit(row_limit)
                .select(ExecutionLogRow::as_select())
                .load::<ExecutionLogRow>(connection)
                .map_err(ExecutionLogRepositoryError::persistence)?;
            rows.into_iter().map(row_to_log).collect()
        })
        .await
    }
}

fn duration_to_column(duration_ms: u64) -> i64 {
    i64::try_from(duration_ms).unwrap_or(i64::MAX)
}

fn to_new_run_row(run: &Run) -> NewRunRow {
    NewRunRow {
        id: run.id().into_inner(),
        workflow_id: run.workflow_id().into_inner(),
        task_id: run.task_id().into_inner(),
        status: run.status().as_str().to_owned(),
        started_at: run.started_at(),
        completed_at: run.completed_at(),
        duration_ms: run.duration_ms().map(duration_to_column),
        error: run.error().map(str::to_owned),
    }
}

fn row_to_run(row: RunRow) -> RunRepositoryResult<Run> {
    let status = RunStatus::try_from(row.status.as_str()).map_err(RunRepositoryError::persistence)?;
    Ok(Run::from_persisted(PersistedRunData {
        id: RunId::from_uuid(row.id),
        workflow_id: WorkflowId::from_uuid(row.workflow_id),
        task_id: TaskId::from_uuid(row.task_id),
        status,
        started_at: row.started_at,
        completed_at: row.completed_at,
        // Negative values cannot be written by this adapter.
        duration_ms: row.duration_ms.map(|ms| u64::try_from(ms).unwrap_or(0)),
        error: row.error,
    }))
}

fn row_to_log(row: ExecutionLogRow) -> ExecutionLogRepositoryResult<ExecutionLog> {
    let level =
        LogLevel::try_from(row.level.as_str()).map_err(ExecutionLogRepositoryError::persistence)?;
    Ok(ExecutionLog::from_persisted(PersistedLogData {
        id: LogId::from_uuid(row.id),
        run_id: RunId::from_uuid(row.run_id),
        level,
        message: row.message,
        data: row.data,
        timestamp: row.timestamp,
    }))
}
