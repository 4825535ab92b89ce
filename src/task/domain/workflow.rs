//! Workflow records attached to tasks.
//!
//! A workflow is created lazily the first time a task without one is
//! executed. Its `steps` column is a placeholder kept for the dashboard; the
//! pipeline never reads it.

use super::{ParseWorkflowStatusError, ProjectId, WorkflowId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Workflow availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Runs may be started against the workflow.
    Active,
    /// The workflow has been switched off by an operator.
    Inactive,
}

impl WorkflowStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl TryFrom<&str> for WorkflowStatus {
    type Error = ParseWorkflowStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(ParseWorkflowStatusError(value.to_owned())),
        }
    }
}

/// Workflow aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    project_id: ProjectId,
    steps: Value,
    status: WorkflowStatus,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkflowData {
    /// Persisted workflow identifier.
    pub id: WorkflowId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Placeholder step definitions.
    pub steps: Value,
    /// Persisted status.
    pub status: WorkflowStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates an active workflow with no step definitions.
    #[must_use]
    pub fn new(project_id: ProjectId, clock: &impl Clock) -> Self {
        Self {
            id: WorkflowId::new(),
            project_id,
            steps: Value::Array(Vec::new()),
            status: WorkflowStatus::Active,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a workflow from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkflowData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            steps: data.steps,
            status: data.status,
            created_at: data.created_at,
        }
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the placeholder step definitions.
    #[must_use]
    pub const fn steps(&self) -> &Value {
        &self.steps
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
