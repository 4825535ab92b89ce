//! Task categories assigned by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category label for a task.
///
/// The classifier prompt enumerates the known labels, but the model's answer
/// is not validated against them: anything else is kept as
/// [`TaskCategory::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskCategory {
    /// Writing or changing source code.
    #[default]
    Code,
    /// Shipping a build to an environment.
    Deploy,
    /// Collecting data from websites.
    Scrape,
    /// Examining data or systems and reporting findings.
    Analysis,
    /// Scripting repetitive work.
    Automation,
    /// Provisioning or operating servers and networks.
    Infrastructure,
    /// Auditing or hardening systems.
    Security,
    /// Writing documentation.
    Documentation,
    /// A label outside the known taxonomy, stored uppercase.
    Other(String),
}

impl TaskCategory {
    /// Known labels, in the order they are presented to the model.
    pub const TAXONOMY: [Self; 8] = [
        Self::Code,
        Self::Deploy,
        Self::Scrape,
        Self::Analysis,
        Self::Automation,
        Self::Infrastructure,
        Self::Security,
        Self::Documentation,
    ];

    /// Normalizes a raw model answer into a category.
    ///
    /// Takes the first whitespace-delimited token, strips surrounding
    /// punctuation, and uppercases it. Returns `None` when nothing is left.
    #[must_use]
    pub fn from_model_answer(raw: &str) -> Option<Self> {
        let token = raw
            .split_whitespace()
            .next()?
            .trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '_');
        if token.is_empty() {
            return None;
        }
        Some(Self::from(token.to_owned()))
    }

    /// Returns the uppercase label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Code => "CODE",
            Self::Deploy => "DEPLOY",
            Self::Scrape => "SCRAPE",
            Self::Analysis => "ANALYSIS",
            Self::Automation => "AUTOMATION",
            Self::Infrastructure => "INFRASTRUCTURE",
            Self::Security => "SECURITY",
            Self::Documentation => "DOCUMENTATION",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for TaskCategory {
    fn from(value: String) -> Self {
        let label = value.trim().to_ascii_uppercase();
        Self::TAXONOMY
            .into_iter()
            .find(|known| known.as_str() == label)
            .unwrap_or(Self::Other(label))
    }
}

impl From<TaskCategory> for String {
    fn from(value: TaskCategory) -> Self {
        match value {
            TaskCategory::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
