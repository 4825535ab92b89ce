//! Domain model for tasks and their workflows.
//!
//! Infrastructure concerns stay outside of the domain boundary; persistence
//! adapters rebuild aggregates through the `Persisted*Data` parameter
//! objects.

mod error;
mod ids;
mod task;
mod workflow;

pub use error::{ParseTaskStatusError, ParseWorkflowStatusError, TaskDomainError};
pub use ids::{ProjectId, TaskId, WorkflowId};
pub use task::{PersistedTaskData, Task, TaskStatus};
pub use workflow::{PersistedWorkflowData, Workflow, WorkflowStatus};
