//! LlmProvider trait abstracting a single language-model backend.
//!
//! The provider chain holds an ordered list of these and handles
//! fallback; individual providers only know how to issue one completion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderResult;

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling and shape parameters for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            json_mode: false,
        }
    }
}

impl CompletionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// Request structured JSON output.
    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// A successful completion, tagged with the provider that produced it.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text
    pub content: String,

    /// Id of the provider that answered
    pub provider_id: String,

    /// Model name used
    pub model: String,

    /// Wall-clock latency of the successful attempt
    pub latency: Duration,
}

/// A single language-model backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable provider id for logging and completion tagging.
    fn id(&self) -> &str;

    /// Issue one completion attempt.
    ///
    /// Errors map onto the fallback taxonomy: `Timeout`, `RateLimited`,
    /// and `Transport` all fail over to the next provider in the chain.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> ProviderResult<Completion>;
}
