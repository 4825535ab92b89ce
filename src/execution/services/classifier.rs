//! Task classification.

use super::config::{CompletionSettings, ExecutionConfig};
use super::prompts::{self, PromptError};
use crate::execution::domain::TaskCategory;
use crate::execution::ports::{CompletionClient, CompletionError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Maps task text to a [`TaskCategory`] with one completion request.
pub struct Classifier<M: CompletionClient> {
    completion: Arc<M>,
    settings: CompletionSettings,
    default_category: TaskCategory,
}

#[derive(Debug, Error)]
enum ClassificationFailure {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("model answer contained no category")]
    Blank,
}

impl<M: CompletionClient> Classifier<M> {
    /// Creates a classifier using the classification settings of `config`.
    #[must_use]
    pub fn new(completion: Arc<M>, config: &ExecutionConfig) -> Self {
        Self {
            completion,
            settings: config.classification,
            default_category: config.default_category.clone(),
        }
    }

    /// Classifies `text`.
    ///
    /// Never fails: any error is logged and the configured default category
    /// is returned instead.
    pub async fn classify(&self, text: &str) -> TaskCategory {
        self.try_classify(text).await.unwrap_or_else(|err| {
            warn!(
                error = %err,
                fallback = %self.default_category,
                "classification failed, using default category"
            );
            self.default_category.clone()
        })
    }

    async fn try_classify(&self, text: &str) -> Result<TaskCategory, ClassificationFailure> {
        let request = self.settings.request(prompts::classifier_system()?, text);
        let answer = self.completion.complete(&request).await?;
        let category =
            TaskCategory::from_model_answer(&answer).ok_or(ClassificationFailure::Blank)?;
        debug!(%category, raw = %answer.trim(), "task classified");
        Ok(category)
    }
}
