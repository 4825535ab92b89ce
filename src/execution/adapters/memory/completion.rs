//! Scripted completion client for tests and offline demos.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::execution::ports::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResult,
};

/// Completion client that replays queued answers in order.
///
/// Every request is recorded. When the queue runs dry the client answers
/// with [`CompletionError::Configuration`], which the pipeline treats like
/// any other provider failure.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionClient {
    state: Arc<Mutex<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    answers: VecDeque<CompletionResult<String>>,
    requests: Vec<CompletionRequest>,
}

impl ScriptedCompletionClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful answer.
    #[must_use]
    pub fn then_answer(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn then_fail(self, error: CompletionError) -> Self {
        self.push(Err(error));
        self
    }

    /// Appends an outcome to the script.
    pub fn push(&self, outcome: CompletionResult<String>) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.answers.push_back(outcome);
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .requests
            .clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult<String> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.requests.push(request.clone());
        state.answers.pop_front().unwrap_or_else(|| {
            Err(CompletionError::Configuration(
                "scripted completion queue is empty".to_owned(),
            ))
        })
    }
}
