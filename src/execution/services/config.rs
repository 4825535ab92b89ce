//! Pipeline configuration.

use crate::execution::domain::{PlanDefaults, TaskCategory};
use crate::execution::ports::CompletionRequest;
use std::time::Duration;

/// Sampling settings for one kind of completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl CompletionSettings {
    /// Creates settings with JSON mode off.
    #[must_use]
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            json_mode: false,
        }
    }

    /// Enables JSON mode.
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Builds a request carrying these settings.
    #[must_use]
    pub fn request(&self, system: impl Into<String>, user: impl Into<String>) -> CompletionRequest {
        CompletionRequest::new(system, user)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_json_mode(self.json_mode)
    }
}

/// Settings for [`super::TaskExecutionService`] and its collaborators.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use foreman::execution::services::ExecutionConfig;
///
/// let config = ExecutionConfig::default()
///     .with_default_step_duration(Duration::from_millis(10))
///     .with_fallback_step_duration(Duration::from_millis(10));
/// assert_eq!(config.default_log_limit, 100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Category used when classification fails.
    pub default_category: TaskCategory,
    /// Settings for the classification request.
    pub classification: CompletionSettings,
    /// Settings for the planning request.
    pub planning: CompletionSettings,
    /// Duration for planned steps that omit one.
    pub default_step_duration: Duration,
    /// Duration of the single step in a fallback plan.
    pub fallback_step_duration: Duration,
    /// Page size for callers that do not pass a log limit.
    pub default_log_limit: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_category: TaskCategory::Code,
            classification: CompletionSettings::new(0.1, 20),
            planning: CompletionSettings::new(0.2, 2000).json(),
            default_step_duration: Duration::from_secs(1),
            fallback_step_duration: Duration::from_secs(5),
            default_log_limit: 100,
        }
    }
}

impl ExecutionConfig {
    /// Sets the fallback category.
    #[must_use]
    pub fn with_default_category(mut self, category: TaskCategory) -> Self {
        self.default_category = category;
        self
    }

    /// Sets the classification request settings.
    #[must_use]
    pub const fn with_classification(mut self, settings: CompletionSettings) -> Self {
        self.classification = settings;
        self
    }

    /// Sets the planning request settings.
    #[must_use]
    pub const fn with_planning(mut self, settings: CompletionSettings) -> Self {
        self.planning = settings;
        self
    }

    /// Sets the duration for steps that omit one.
    #[must_use]
    pub const fn with_default_step_duration(mut self, duration: Duration) -> Self {
        self.default_step_duration = duration;
        self
    }

    /// Sets the duration of the fallback step.
    #[must_use]
    pub const fn with_fallback_step_duration(mut self, duration: Duration) -> Self {
        self.fallback_step_duration = duration;
        self
    }

    /// Sets the default log page size.
    #[must_use]
    pub const fn with_default_log_limit(mut self, limit: usize) -> Self {
        self.default_log_limit = limit;
        self
    }

    /// Returns the defaults applied while decoding plans.
    #[must_use]
    pub const fn plan_defaults(&self) -> PlanDefaults {
        PlanDefaults {
            step_duration: self.default_step_duration,
            fallback_step_duration: self.fallback_step_duration,
        }
    }
}
