//! Port contracts for the execution pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by the execution
//! services: the language-model completion endpoint, run and log
//! persistence, and the realtime progress channel.

pub mod completion;
pub mod log;
pub mod progress;
pub mod run;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, CompletionResult};
pub use log::{ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult};
pub use progress::{ProgressPublisher, PublishError, PublishResult};
pub use run::{RunRepository, RunRepositoryError, RunRepositoryResult};
