//! Hacker News adapter (Algolia search API).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::traits::adapter::SourceAdapter;
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};

const DEFAULT_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";

/// Fetches story hits from the Algolia-hosted HN search API.
pub struct HackerNewsAdapter {
    endpoint: String,
    timeout: Duration,
}

impl Default for HackerNewsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HackerNewsAdapter {
    /// Create an adapter against the live Algolia endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Point at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn source_id(&self) -> String {
        self.source().id().to_string()
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    fn source(&self) -> ContentSource {
        ContentSource::HackerNews
    }

    fn source_type(&self) -> SourceType {
        SourceType::Post
    }

    async fn fetch(&self, query: &str, limit: usize) -> AdapterResult<Vec<RawItem>> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AdapterError::Http {
                source_id: self.source_id(),
                message: e.to_string(),
            })?;

        let hits_per_page = limit.min(50).to_string();
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", hits_per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout {
                        source_id: self.source_id(),
                    }
                } else {
                    AdapterError::Http {
                        source_id: self.source_id(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AdapterError::RateLimited {
                source_id: self.source_id(),
            });
        }
        if !status.is_success() {
            return Err(AdapterError::Http {
                source_id: self.source_id(),
                message: format!("HTTP {status}"),
            });
        }

        let body: Value = response.json().await.map_err(|e| AdapterError::BadResponse {
            source_id: self.source_id(),
            reason: e.to_string(),
        })?;

        let items: Vec<RawItem> = body
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .map(|hit| RawItem::new(self.source_id(), hit.clone()))
                    .collect()
            })
            .unwrap_or_default();

        debug!(query, count = items.len(), "hackernews fetch complete");
        Ok(items)
    }

    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent> {
        let title = raw.payload.get("title")?.as_str()?;

        // Link-only stories carry no text; the title is the content then.
        let content = raw
            .payload
            .get("story_text")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(title);

        let mut item =
            NormalizedContent::new(self.source(), self.source_type(), title, content)?;

        let url = raw
            .payload
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                raw.payload
                    .get("objectID")
                    .and_then(Value::as_str)
                    .map(|id| format!("https://news.ycombinator.com/item?id={id}"))
            });
        if let Some(url) = url {
            item = item.with_url(url);
        }

        if let Some(created) = raw.payload.get("created_at").and_then(Value::as_str) {
            if let Ok(ts) = DateTime::parse_from_rfc3339(created) {
                item = item.with_published_at(ts.with_timezone(&Utc));
            }
        }
        if let Some(points) = raw.payload.get("points").and_then(Value::as_u64) {
            item = item.with_metadata("points", points.to_string());
        }
        if let Some(author) = raw.payload.get("author").and_then(Value::as_str) {
            item = item.with_metadata("author", author.to_string());
        }

        Some(item)
    }
}
