//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline
//! without making real network or LLM calls. Every mock tracks its
//! calls so tests can assert on interaction counts.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{AdapterError, AdapterResult, ProviderError, ProviderResult};
use crate::traits::adapter::SourceAdapter;
use crate::traits::media::{MediaGenerator, MediaKind};
use crate::traits::provider::{ChatMessage, Completion, CompletionParams, LlmProvider};
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};
use crate::types::lesson::MediaResult;

/// A mock content source returning deterministic items.
pub struct MockAdapter {
    id: String,
    source_type: SourceType,
    titles: Vec<String>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockAdapter {
    /// Create a mock source with the given id and no items.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_type: SourceType::Article,
            titles: Vec::new(),
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Produce `n` generated items ("<id> item <i>").
    pub fn with_items(mut self, n: usize) -> Self {
        self.titles = (0..n).map(|i| format!("{} item {}", self.id, i)).collect();
        self
    }

    /// Produce items with explicit titles.
    pub fn with_titles(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.titles = titles.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the source type reported for items.
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Make every fetch fail with a timeout.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Handle for asserting on the number of fetch calls.
    pub fn call_count_handle(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn source(&self) -> ContentSource {
        ContentSource::Other(self.id.clone())
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn fetch(&self, _query: &str, limit: usize) -> AdapterResult<Vec<RawItem>> {
        *self.calls.lock().unwrap() += 1;

        if self.fail {
            return Err(AdapterError::Timeout {
                source_id: self.id.clone(),
            });
        }

        Ok(self
            .titles
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, title)| {
                RawItem::new(
                    self.id.clone(),
                    json!({
                        "title": title,
                        "body": format!("Body of {title}"),
                        "age_minutes": i as u64,
                    }),
                )
            })
            .collect())
    }

    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent> {
        let title = raw.payload.get("title")?.as_str()?;
        let body = raw.payload.get("body")?.as_str()?;
        let age = raw.payload.get("age_minutes")?.as_u64()? as i64;

        Some(
            NormalizedContent::new(self.source(), self.source_type, title, body)?
                .with_published_at(Utc::now() - ChronoDuration::minutes(age)),
        )
    }
}

/// Scripted outcome of one mock provider call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with this reply text
    Reply(String),
    Timeout,
    RateLimited,
    Transport,
}

/// A mock language-model provider with a per-call outcome script.
///
/// Outcomes are consumed from the script front; when the script runs
/// out, the default outcome repeats.
pub struct MockProvider {
    id: String,
    script: Mutex<VecDeque<MockOutcome>>,
    default_outcome: MockOutcome,
    calls: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a provider whose calls succeed with an empty reply.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(VecDeque::new()),
            default_outcome: MockOutcome::Reply(String::new()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always reply with this text.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_outcome = MockOutcome::Reply(reply.into());
        self
    }

    /// Always produce this outcome.
    pub fn with_outcome(mut self, outcome: MockOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Script the first N calls; later calls use the default outcome.
    pub fn with_script(self, outcomes: Vec<MockOutcome>) -> Self {
        *self.script.lock().unwrap() = outcomes.into();
        self
    }

    /// Handle for asserting on the number of complete calls.
    pub fn call_count_handle(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _params: &CompletionParams,
    ) -> ProviderResult<Completion> {
        *self.calls.lock().unwrap() += 1;

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());

        match outcome {
            MockOutcome::Reply(content) => Ok(Completion {
                content,
                provider_id: self.id.clone(),
                model: "mock".to_string(),
                latency: Duration::from_millis(1),
            }),
            MockOutcome::Timeout => Err(ProviderError::Timeout {
                provider_id: self.id.clone(),
            }),
            MockOutcome::RateLimited => Err(ProviderError::RateLimited {
                provider_id: self.id.clone(),
            }),
            MockOutcome::Transport => Err(ProviderError::Transport {
                provider_id: self.id.clone(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// A mock media collaborator that always succeeds or always fails.
pub struct MockMedia {
    kind: MediaKind,
    succeed: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockMedia {
    /// A collaborator that returns a hosted URL for every prompt.
    pub fn succeeding(kind: MediaKind) -> Self {
        Self {
            kind,
            succeed: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A collaborator whose provider is down.
    pub fn failing(kind: MediaKind) -> Self {
        Self {
            kind,
            succeed: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Handle for asserting on the number of generate calls.
    pub fn call_count_handle(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl MediaGenerator for MockMedia {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    async fn generate(&self, prompt: &str, _options: &HashMap<String, String>) -> MediaResult {
        *self.calls.lock().unwrap() += 1;

        if self.succeed {
            MediaResult::ok(
                "mock-media",
                format!("https://cdn.example.com/{}/{}", self.kind, prompt.len()),
            )
        } else {
            MediaResult::failed("mock-media", "provider unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_adapter_items_and_count() {
        let adapter = MockAdapter::new("mock").with_items(3);
        let calls = adapter.call_count_handle();

        let items = adapter.fetch_and_normalize("topic", 2).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source.id(), "mock");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_script_then_default() {
        let provider = MockProvider::new("p")
            .with_reply("default")
            .with_script(vec![MockOutcome::Transport]);

        let err = provider
            .complete(&[], &CompletionParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));

        let ok = provider
            .complete(&[], &CompletionParams::default())
            .await
            .unwrap();
        assert_eq!(ok.content, "default");
    }

    #[tokio::test]
    async fn test_mock_media_modes() {
        let ok = MockMedia::succeeding(MediaKind::Image);
        let result = ok.generate("prompt", &HashMap::new()).await;
        assert!(result.success);
        assert!(result.url.is_some());

        let down = MockMedia::failing(MediaKind::Audio);
        let result = down.generate("prompt", &HashMap::new()).await;
        assert!(!result.success);
        assert!(result.url.is_none());
    }
}
