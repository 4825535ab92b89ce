//! In-memory adapters for runs, logs, and scripted completions.

mod completion;
mod log;
mod run;

pub use completion::ScriptedCompletionClient;
pub use log::InMemoryExecutionLogRepository;
pub use run::InMemoryRunRepository;
