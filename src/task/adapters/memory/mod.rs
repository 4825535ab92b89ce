//! In-memory task and workflow repositories.

mod task;
mod workflow;

pub use task::InMemoryTaskRepository;
pub use workflow::InMemoryWorkflowRepository;
