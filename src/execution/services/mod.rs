//! Application services for the execution pipeline.
//!
//! [`TaskExecutionService`] drives a run end to end. The classifier,
//! planner, and step runner are exposed separately so hosts can reuse them.

mod cancellation;
mod classifier;
mod config;
mod executor;
mod planner;
pub mod prompts;
mod step_runner;

pub use cancellation::{CancelRequest, CancellationRegistry, CancellationSignal};
pub use classifier::Classifier;
pub use config::{CompletionSettings, ExecutionConfig};
pub use executor::{ExecutionStores, TaskExecutionError, TaskExecutionResult, TaskExecutionService};
pub use planner::Planner;
pub use prompts::PromptError;
pub use step_runner::{StepOutcome, StepRunner};
