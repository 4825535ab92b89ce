//! HTTP completion adapter for OpenAI-compatible and Anthropic endpoints.
//!
//! Local model gateways that speak the OpenAI chat-completions dialect are
//! supported through [`CompletionProvider::Local`], which sends no API key.

mod client;
mod config;
mod wire;

pub use client::HttpCompletionClient;
pub use config::{CompletionConfig, CompletionProvider};
