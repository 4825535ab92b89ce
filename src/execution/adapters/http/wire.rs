//! Request and response bodies for the supported completion dialects.

use crate::execution::ports::CompletionRequest;
use serde::{Deserialize, Serialize};

/// Anthropic API version header value.
pub(super) const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct Message<'a> {
    pub(super) role: &'static str,
    pub(super) content: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct ResponseFormat {
    #[serde(rename = "type")]
    pub(super) kind: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct OpenAiRequest<'a> {
    pub(super) model: &'a str,
    pub(super) messages: Vec<Message<'a>>,
    pub(super) temperature: f32,
    pub(super) max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) response_format: Option<ResponseFormat>,
}

impl<'a> OpenAiRequest<'a> {
    pub(super) fn from_request(model: &'a str, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiResponse {
    pub(super) fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct AnthropicRequest<'a> {
    pub(super) model: &'a str,
    pub(super) max_tokens: u32,
    pub(super) system: &'a str,
    pub(super) messages: Vec<Message<'a>>,
    pub(super) temperature: f32,
}

impl<'a> AnthropicRequest<'a> {
    pub(super) fn from_request(model: &'a str, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.user,
            }],
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicResponse {
    pub(super) fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}
