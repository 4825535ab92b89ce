//! Configuration for the HTTP completion adapter.

use crate::execution::ports::CompletionError;
use std::time::Duration;

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default client-level request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Wire dialect spoken by the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionProvider {
    /// `OpenAI` chat completions with bearer authentication.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// OpenAI-compatible local gateway without authentication.
    Local,
}

impl CompletionProvider {
    /// Guesses the dialect from the endpoint URL.
    #[must_use]
    pub fn detect(api_url: &str) -> Self {
        if api_url.contains("anthropic.com") {
            Self::Anthropic
        } else if api_url.contains("localhost") || api_url.contains("127.0.0.1") {
            Self::Local
        } else {
            Self::OpenAi
        }
    }
}

impl TryFrom<&str> for CompletionProvider {
    type Error = CompletionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "local" => Ok(Self::Local),
            other => Err(CompletionError::Configuration(format!(
                "unknown completion provider '{other}'"
            ))),
        }
    }
}

/// Connection settings for [`super::HttpCompletionClient`].
///
/// # Examples
///
/// ```
/// use foreman::execution::adapters::http::{CompletionConfig, CompletionProvider};
///
/// let config = CompletionConfig::new("http://localhost:8080/v1/chat/completions", "llama3");
/// assert_eq!(config.provider, CompletionProvider::Local);
/// assert!(config.api_key.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Endpoint dialect.
    pub provider: CompletionProvider,
    /// Full endpoint URL.
    pub api_url: String,
    /// API key; required by every provider except [`CompletionProvider::Local`].
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Client-level request timeout.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_MODEL)
    }
}

impl CompletionConfig {
    /// Creates a configuration with the provider detected from the URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        let api_url = api_url.into();
        Self {
            provider: CompletionProvider::detect(&api_url),
            api_url,
            api_key: None,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the detected provider.
    #[must_use]
    pub const fn with_provider(mut self, provider: CompletionProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the configuration from the environment.
    ///
    /// - `LLM_API_URL`: endpoint (default [`DEFAULT_API_URL`])
    /// - `LLM_API_KEY`: API key (optional)
    /// - `LLM_MODEL`: model (default [`DEFAULT_MODEL`])
    /// - `LLM_PROVIDER`: `openai`, `anthropic`, or `local` (detected from the
    ///   URL when unset)
    /// - `LLM_TIMEOUT_SECS`: request timeout in seconds (default 120)
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] for an unknown provider, an
    /// unparsable timeout, or a missing key for a remote provider.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`CompletionConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CompletionError> {
        let api_url = lookup("LLM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let model = lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let mut config = Self::new(api_url, model);

        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.provider = CompletionProvider::try_from(provider.as_str())?;
        }
        if let Some(seconds) = lookup("LLM_TIMEOUT_SECS") {
            let parsed = seconds.trim().parse::<u64>().map_err(|err| {
                CompletionError::Configuration(format!("invalid LLM_TIMEOUT_SECS '{seconds}': {err}"))
            })?;
            config.timeout = Duration::from_secs(parsed);
        }
        config.api_key = lookup("LLM_API_KEY").filter(|key| !key.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Checks that remote providers have an API key.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] when the key is missing.
    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.provider != CompletionProvider::Local && self.api_key.is_none() {
            return Err(CompletionError::Configuration(
                "LLM_API_KEY is required for remote providers".to_owned(),
            ));
        }
        Ok(())
    }
}
