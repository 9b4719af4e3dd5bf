//! Provider for OpenAI-compatible chat-completion APIs.
//!
//! Most hosted LLM endpoints (OpenAI, Groq, OpenRouter, Together) speak
//! the same wire shape, so one provider type covers the whole chain:
//! instantiate it once per slot with its own base URL, model, and key.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::provider::{ChatMessage, Completion, CompletionParams, LlmProvider};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// A single OpenAI-compatible provider handle.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider handle.
    ///
    /// `base_url` is the API root without the `/chat/completions` suffix,
    /// e.g. `https://api.groq.com/openai/v1`.
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("reqwest client construction only fails with invalid TLS config"),
        }
    }

    /// Replace the HTTP client (custom timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn transport(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Transport {
            provider_id: self.id.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> ProviderResult<Completion> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            response_format: params.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider_id: self.id.clone(),
                    }
                } else {
                    self.transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited {
                provider_id: self.id.clone(),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            // Some gateways report quota exhaustion as 403 with a quota body.
            if detail.contains("quota") || detail.contains("rate_limit") {
                return Err(ProviderError::RateLimited {
                    provider_id: self.id.clone(),
                });
            }
            return Err(self.transport(format!("HTTP {status}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport(format!("bad response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.transport("response carried no choices"))?;

        Ok(Completion {
            content,
            provider_id: self.id.clone(),
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
            latency: start.elapsed(),
        })
    }
}
