//! `PostgreSQL` repository implementations for tasks and workflows.

use super::{
    models::{NewTaskRow, NewWorkflowRow, TaskChangeset, TaskRow, WorkflowRow},
    schema::{tasks, workflows},
};
use crate::task::{
    domain::{
        PersistedTaskData, PersistedWorkflowData, ProjectId, Task, TaskId, TaskStatus, Workflow,
        WorkflowId, WorkflowStatus,
    },
    ports::{
        TaskRepository, TaskRepositoryError, TaskRepositoryResult, WorkflowRepository,
        WorkflowRepositoryError, WorkflowRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type shared by the persistence adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_task_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    other => TaskRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = TaskChangeset {
            status: task.status().as_str().to_owned(),
            workflow_id: task.workflow_id().map(WorkflowId::into_inner),
            updated_at: task.updated_at(),
        };

        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&changeset)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }
}

/// `PostgreSQL`-backed workflow repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowRepository {
    pool: TaskPgPool,
}

impl PostgresWorkflowRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkflowRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkflowRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkflowRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkflowRepositoryError::persistence)?
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let workflow_id = workflow.id();
        let new_row = NewWorkflowRow {
            id: workflow_id.into_inner(),
            project_id: workflow.project_id().into_inner(),
            steps: workflow.steps().clone(),
            status: workflow.status().as_str().to_owned(),
            created_at: workflow.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(workflows::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkflowRepositoryError::DuplicateWorkflow(workflow_id)
                    }
                    other => WorkflowRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: WorkflowId) -> WorkflowRepositoryResult<Option<Workflow>> {
        self.run_blocking(move |connection| {
            let row = workflows::table
                .find(id.into_inner())
                .select(WorkflowRow::as_select())
                .first::<WorkflowRow>(connection)
                .optional()
                .map_err(WorkflowRepositoryError::persistence)?;
            row.map(row_to_workflow).transpose()
        })
        .await
    }
}

fn to_new_task_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        workflow_id: task.workflow_id().map(WorkflowId::into_inner),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let status = TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        title: row.title,
        description: row.description,
        status,
        workflow_id: row.workflow_id.map(WorkflowId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_workflow(row: WorkflowRow) -> WorkflowRepositoryResult<Workflow> {
    let status = WorkflowStatus::try_from(row.status.as_str())
        .map_err(WorkflowRepositoryError::persistence)?;
    Ok(Workflow::from_persisted(PersistedWorkflowData {
        id: WorkflowId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        steps: row.steps,
        status,
        created_at: row.created_at,
    }))
}
