//! Simulated step execution.

use super::cancellation::CancellationSignal;
use crate::execution::domain::{PlanStep, StepTool};
use serde::Serialize;

/// Result of one simulated step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Step identifier.
    pub step_id: String,
    /// Declared tool.
    pub tool: StepTool,
    /// Always `true`: simulated steps cannot fail.
    pub success: bool,
    /// Canned output text.
    pub output: String,
}

/// Runs plan steps as timed no-ops.
///
/// No tool is invoked. Each step sleeps for its estimated duration and
/// reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner;

impl StepRunner {
    /// Creates a step runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `step`, returning `None` if `signal` fires before it finishes.
    pub async fn run(&self, step: &PlanStep, signal: &CancellationSignal) -> Option<StepOutcome> {
        signal
            .run_until_cancelled(tokio::time::sleep(step.estimated_duration()))
            .await?;
        Some(StepOutcome {
            step_id: step.id().to_owned(),
            tool: step.tool().clone(),
            success: true,
            output: format!("Executed {} using {}", step.description(), step.tool()),
        })
    }
}
