//! Language-model completion port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for completion requests.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// One completion request: a system instruction plus the user text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// User message.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl CompletionRequest {
    /// Creates a request with temperature `0.0`, 1024 max tokens, and JSON
    /// mode off.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
            max_tokens: 1024,
            json_mode: false,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the token limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enables or disables JSON mode.
    #[must_use]
    pub const fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Completion contract implemented by provider adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the request and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError`] on transport, authentication, rate-limit,
    /// or malformed-response failures.
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult<String>;
}

/// Errors returned by completion adapters.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The provider answered without any text.
    #[error("provider returned an empty completion")]
    EmptyResponse,

    /// The adapter is misconfigured.
    #[error("completion client misconfigured: {0}")]
    Configuration(String),

    /// Network or decoding failure.
    #[error("completion transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl CompletionError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
