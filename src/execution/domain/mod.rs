//! Domain model for runs, plans, execution logs, and progress events.

mod category;
mod error;
mod event;
mod ids;
mod log;
mod plan;
mod run;

pub use category::TaskCategory;
pub use error::{ExecutionDomainError, ParseLogLevelError, ParseRunStatusError, PlanParseError};
pub use event::{ChannelKey, ProgressEvent, ProgressEventKind, RunContext};
pub use ids::{LogId, RunId, UserId};
pub use log::{ExecutionLog, LogLevel, PersistedLogData};
pub use plan::{Plan, PlanDefaults, PlanStep, StepTool};
pub use run::{PersistedRunData, Run, RunStatus};
