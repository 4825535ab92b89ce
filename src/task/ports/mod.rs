//! Port contracts for task and workflow persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the execution
//! services.

pub mod repository;
pub mod workflow;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use workflow::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult};
