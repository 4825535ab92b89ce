//! Plan generation.

use super::config::{CompletionSettings, ExecutionConfig};
use super::prompts::{self, PromptError};
use crate::execution::domain::{Plan, PlanDefaults, PlanParseError, TaskCategory};
use crate::execution::ports::{CompletionClient, CompletionError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Asks the model for a step plan and decodes it.
pub struct Planner<M: CompletionClient> {
    completion: Arc<M>,
    settings: CompletionSettings,
    defaults: PlanDefaults,
}

#[derive(Debug, Error)]
enum PlanningFailure {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Parse(#[from] PlanParseError),
}

impl<M: CompletionClient> Planner<M> {
    /// Creates a planner using the planning settings of `config`.
    #[must_use]
    pub fn new(completion: Arc<M>, config: &ExecutionConfig) -> Self {
        Self {
            completion,
            settings: config.planning,
            defaults: config.plan_defaults(),
        }
    }

    /// Produces a plan for `text`.
    ///
    /// Never fails. When the request fails or the answer cannot be decoded,
    /// the single-step fallback plan wrapping the whole task is returned.
    /// An empty `steps` array is a valid plan and is returned as is.
    pub async fn plan(&self, text: &str, category: &TaskCategory) -> Plan {
        self.try_plan(text, category).await.unwrap_or_else(|err| {
            warn!(error = %err, %category, "planning failed, using single-step fallback plan");
            Plan::fallback(text, self.defaults.fallback_step_duration)
        })
    }

    async fn try_plan(&self, text: &str, category: &TaskCategory) -> Result<Plan, PlanningFailure> {
        let request = self.settings.request(
            prompts::planner_system(category)?,
            prompts::planner_user(text, category)?,
        );
        let answer = self.completion.complete(&request).await?;
        let plan = Plan::from_model_output(&answer, &self.defaults)?;
        debug!(steps = plan.len(), tools = ?plan.required_tools(), "plan decoded");
        Ok(plan)
    }
}
