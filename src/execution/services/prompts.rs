//! Prompt templates for the classifier and the planner.
//!
//! Templates are rendered with `minijinja`; autoescaping is off because the
//! output is plain text sent to a model.

use crate::execution::domain::{StepTool, TaskCategory};
use minijinja::{Environment, context};
use thiserror::Error;

const CLASSIFIER_SYSTEM: &str = "\
You classify software and operations tasks.
Choose exactly one category from this list:
{% for category in categories %}- {{ category }}
{% endfor %}
Respond with only the category name.";

const PLANNER_SYSTEM: &str = "\
You plan the execution of a {{ category }} task as a list of sequential steps.
Available tools: {{ tools | join(\", \") }}.
Respond with a single JSON object of this shape:
{\"steps\": [{\"id\": \"1\", \"description\": \"...\", \"tool\": \"exec\", \"parameters\": {}, \
\"dependsOn\": [], \"estimatedDuration\": 1000}], \"requiredTools\": [\"exec\"]}
estimatedDuration is in milliseconds. Do not add any text outside the JSON object.";

const PLANNER_USER: &str = "\
Category: {{ category }}

Task:
{{ task }}";

/// Tools advertised to the planner.
pub const PLANNER_TOOLS: [StepTool; 5] = [
    StepTool::Fs,
    StepTool::Http,
    StepTool::Docker,
    StepTool::Exec,
    StepTool::Security,
];

/// Error raised when a prompt template fails to render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {template} prompt: {reason}")]
pub struct PromptError {
    /// Template name.
    pub template: &'static str,
    /// Renderer message.
    pub reason: String,
}

/// Renders the classifier system prompt listing the known categories.
///
/// # Errors
///
/// Returns [`PromptError`] when rendering fails.
pub fn classifier_system() -> Result<String, PromptError> {
    let categories: Vec<&str> = TaskCategory::TAXONOMY
        .iter()
        .map(TaskCategory::as_str)
        .collect();
    render("classifier", CLASSIFIER_SYSTEM, context! { categories })
}

/// Renders the planner system prompt for a category.
///
/// # Errors
///
/// Returns [`PromptError`] when rendering fails.
pub fn planner_system(category: &TaskCategory) -> Result<String, PromptError> {
    let tools: Vec<&str> = PLANNER_TOOLS.iter().map(StepTool::as_str).collect();
    render(
        "planner",
        PLANNER_SYSTEM,
        context! { category => category.as_str(), tools },
    )
}

/// Renders the planner user message.
///
/// # Errors
///
/// Returns [`PromptError`] when rendering fails.
pub fn planner_user(task_text: &str, category: &TaskCategory) -> Result<String, PromptError> {
    render(
        "planner request",
        PLANNER_USER,
        context! { category => category.as_str(), task => task_text },
    )
}

fn render(
    template: &'static str,
    source: &str,
    ctx: minijinja::Value,
) -> Result<String, PromptError> {
    Environment::new()
        .render_str(source, ctx)
        .map_err(|err| PromptError {
            template,
            reason: err.to_string(),
        })
}
