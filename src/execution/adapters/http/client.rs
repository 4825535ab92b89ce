//! reqwest-backed [`CompletionClient`].

use super::config::{CompletionConfig, CompletionProvider};
use super::wire::{
    ANTHROPIC_VERSION, AnthropicRequest, AnthropicResponse, OpenAiRequest, OpenAiResponse,
};
use crate::execution::ports::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResult,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Completion client for `OpenAI`-compatible, Anthropic, and local
/// endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl HttpCompletionClient {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] when the configuration is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: CompletionConfig) -> CompletionResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| CompletionError::Configuration(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Creates a client from `LLM_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`CompletionConfig::from_env`] and [`HttpCompletionClient::new`].
    pub fn from_env() -> CompletionResult<Self> {
        Self::new(CompletionConfig::from_env()?)
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match (self.config.provider, self.config.api_key.as_deref()) {
            (CompletionProvider::Anthropic, Some(key)) => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            (CompletionProvider::Anthropic, None) => {
                builder.header("anthropic-version", ANTHROPIC_VERSION)
            }
            (_, Some(key)) => builder.bearer_auth(key),
            (_, None) => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> CompletionResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(CompletionError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CompletionError::Provider {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    async fn complete_openai(&self, request: &CompletionRequest) -> CompletionResult<String> {
        let body = OpenAiRequest::from_request(&self.config.model, request);
        let response: OpenAiResponse = self
            .send(self.client.post(&self.config.api_url).json(&body))
            .await?
            .json()
            .await
            .map_err(CompletionError::transport)?;
        response.into_text().ok_or(CompletionError::EmptyResponse)
    }

    async fn complete_anthropic(&self, request: &CompletionRequest) -> CompletionResult<String> {
        let body = AnthropicRequest::from_request(&self.config.model, request);
        let response: AnthropicResponse = self
            .send(self.client.post(&self.config.api_url).json(&body))
            .await?
            .json()
            .await
            .map_err(CompletionError::transport)?;
        response.into_text().ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult<String> {
        debug!(
            provider = ?self.config.provider,
            model = %self.config.model,
            json_mode = request.json_mode,
            "sending completion request"
        );
        let text = match self.config.provider {
            CompletionProvider::Anthropic => self.complete_anthropic(request).await?,
            CompletionProvider::OpenAi | CompletionProvider::Local => {
                self.complete_openai(request).await?
            }
        };
        if text.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(text)
    }
}
