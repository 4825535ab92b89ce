//! Step plans produced by the planner.
//!
//! Plans come from free-form model output, so decoding is deliberately
//! lenient: once the text parses as a JSON object, every missing or oddly
//! typed field falls back to a default instead of rejecting the plan.

use super::PlanParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Tool a step claims to need.
///
/// Steps are simulated, so the tool is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepTool {
    /// Filesystem access.
    Fs,
    /// Outbound HTTP.
    Http,
    /// Container management.
    Docker,
    /// Shell command execution.
    Exec,
    /// Security scanning.
    Security,
    /// Any other tool name the model produced, stored lowercase.
    Other(String),
}

impl StepTool {
    /// Returns the lowercase tool name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fs => "fs",
            Self::Http => "http",
            Self::Docker => "docker",
            Self::Exec => "exec",
            Self::Security => "security",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for StepTool {
    fn from(value: String) -> Self {
        let name = value.trim().to_ascii_lowercase();
        match name.as_str() {
            "fs" => Self::Fs,
            "http" => Self::Http,
            "docker" => Self::Docker,
            "exec" => Self::Exec,
            "security" => Self::Security,
            _ => Self::Other(name),
        }
    }
}

impl From<StepTool> for String {
    fn from(value: StepTool) -> Self {
        match value {
            StepTool::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for StepTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    id: String,
    description: String,
    tool: StepTool,
    parameters: Value,
    depends_on: Vec<String>,
    #[serde(rename = "estimatedDuration")]
    estimated_duration_ms: u64,
}

impl PlanStep {
    /// Creates a step with no parameters and no dependencies.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        tool: StepTool,
        estimated_duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            tool,
            parameters: Value::Object(Map::new()),
            depends_on: Vec::new(),
            estimated_duration_ms: duration_to_ms(estimated_duration),
        }
    }

    /// Sets the parameter bag.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the identifiers of steps this one depends on.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: impl IntoIterator<Item = String>) -> Self {
        self.depends_on = depends_on.into_iter().collect();
        self
    }

    /// Returns the step identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared tool.
    #[must_use]
    pub const fn tool(&self) -> &StepTool {
        &self.tool
    }

    /// Returns the parameter bag.
    #[must_use]
    pub const fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Returns the declared dependencies.
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Returns the declared duration, used as the simulated delay.
    #[must_use]
    pub const fn estimated_duration(&self) -> Duration {
        Duration::from_millis(self.estimated_duration_ms)
    }
}

/// Defaults applied while decoding model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDefaults {
    /// Duration for steps that omit `estimatedDuration`.
    pub step_duration: Duration,
    /// Duration of the single step in a fallback plan.
    pub fallback_step_duration: Duration,
}

/// Ordered step plan for one run.
///
/// `dependencies` mirrors each step's `dependsOn` list keyed by step id. It
/// is exposed for logs and events only; steps run in array order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    steps: Vec<PlanStep>,
    required_tools: Vec<StepTool>,
    dependencies: BTreeMap<String, Vec<String>>,
}

impl Plan {
    /// Builds a plan from steps, deriving tools and the dependency map.
    #[must_use]
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self::with_declared_tools(steps, Vec::new())
    }

    fn with_declared_tools(steps: Vec<PlanStep>, declared: Vec<StepTool>) -> Self {
        let mut required_tools: Vec<StepTool> = Vec::new();
        for tool in declared
            .into_iter()
            .chain(steps.iter().map(|step| step.tool.clone()))
        {
            if !required_tools.contains(&tool) {
                required_tools.push(tool);
            }
        }

        let dependencies = steps
            .iter()
            .map(|step| (step.id.clone(), step.depends_on.clone()))
            .collect();

        Self {
            steps,
            required_tools,
            dependencies,
        }
    }

    /// Returns the single-step plan used when planning fails.
    #[must_use]
    pub fn fallback(task_text: &str, duration: Duration) -> Self {
        Self::new(vec![PlanStep::new("1", task_text, StepTool::Exec, duration)])
    }

    /// Decodes a plan from raw model output.
    ///
    /// The outermost `{...}` span is extracted first, so prose or code fences
    /// around the JSON are tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`PlanParseError`] when no JSON object is present or it does
    /// not parse.
    pub fn from_model_output(raw: &str, defaults: &PlanDefaults) -> Result<Self, PlanParseError> {
        let json = extract_json_object(raw).ok_or(PlanParseError::NoJsonObject)?;
        let value: Value =
            serde_json::from_str(json).map_err(|err| PlanParseError::Malformed(err.to_string()))?;
        let Value::Object(root) = value else {
            return Err(PlanParseError::Malformed("plan is not a JSON object".to_owned()));
        };

        let steps = array_field(&root, "steps")
            .iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(index, step)| decode_step(step, index, defaults))
            .collect();
        let declared = array_field(&root, "requiredTools")
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(|name| StepTool::from(name.to_owned()))
            .collect();
        Ok(Self::with_declared_tools(steps, declared))
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Returns the union of tools named by the model and used by steps.
    #[must_use]
    pub fn required_tools(&self) -> &[StepTool] {
        &self.required_tools
    }

    /// Returns the step dependency map.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeMap<String, Vec<String>> {
        &self.dependencies
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` for a plan without steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Returns the array stored under `key`; absent, null, or non-array values
/// read as empty.
fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn decode_step(step: &Map<String, Value>, index: usize, defaults: &PlanDefaults) -> PlanStep {
    let id = step
        .get("id")
        .and_then(scalar_to_string)
        .unwrap_or_else(|| format!("step-{}", index.saturating_add(1)));
    let description = step
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let tool = step
        .get("tool")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map_or(StepTool::Exec, |name| StepTool::from(name.to_owned()));
    let parameters = match step.get("parameters") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(other) => other.clone(),
    };
    let depends_on = array_field(step, "dependsOn")
        .iter()
        .filter_map(scalar_to_string)
        .collect::<Vec<_>>();
    let duration = step
        .get("estimatedDuration")
        .and_then(duration_from_value)
        .unwrap_or(defaults.step_duration);

    PlanStep::new(id, description, tool, duration)
        .with_parameters(parameters)
        .with_depends_on(depends_on)
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    raw.get(start..=end)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn duration_from_value(value: &Value) -> Option<Duration> {
    match value {
        Value::Number(number) => number.as_u64().map(Duration::from_millis),
        Value::String(text) => text.trim().parse::<u64>().ok().map(Duration::from_millis),
        _ => None,
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
