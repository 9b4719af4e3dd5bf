//! Wikipedia adapter (MediaWiki search + extracts API).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::traits::adapter::SourceAdapter;
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};

const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Fetches article intros via a single `generator=search` query.
pub struct WikipediaAdapter {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl Default for WikipediaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WikipediaAdapter {
    /// Create an adapter against the live English Wikipedia API.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: "lessongen/0.1 (content acquisition)".to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    /// Point at a different MediaWiki endpoint (another language wiki,
    /// or a local stub in tests).
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
impl SourceAdapter for WikipediaAdapter {
    fn source(&self) -> ContentSource {
        ContentSource::Wikipedia
    }

    fn source_type(&self) -> SourceType {
        SourceType::Article
    }

    async fn fetch(&self, query: &str, limit: usize) -> AdapterResult<Vec<RawItem>> {
        // Scoped client per call; dropped on every exit path.
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| AdapterError::Http {
                source_id: self.source_id(),
                message: e.to_string(),
            })?;

        let limit_str = limit.min(50).to_string();
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit_str.as_str()),
                ("prop", "extracts|info"),
                ("explaintext", "1"),
                ("exintro", "1"),
                ("inprop", "url"),
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

        // query.pages is a pageid-keyed object; absent when zero hits.
        let pages = body
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(Value::as_object);

        let items: Vec<RawItem> = match pages {
            Some(pages) => pages
                .values()
                .map(|page| RawItem::new(self.source_id(), page.clone()))
                .collect(),
            None => Vec::new(),
        };

        debug!(query, count = items.len(), "wikipedia fetch complete");
        Ok(items)
    }

    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent> {
        let title = raw.payload.get("title")?.as_str()?;
        let extract = raw.payload.get("extract")?.as_str()?;

        let mut item =
            NormalizedContent::new(self.source(), self.source_type(), title, extract)?;

        if let Some(url) = raw.payload.get("fullurl").and_then(Value::as_str) {
            item = item.with_url(url);
        }
        if let Some(touched) = raw.payload.get("touched").and_then(Value::as_str) {
            if let Ok(ts) = DateTime::parse_from_rfc3339(touched) {
                item = item.with_published_at(ts.with_timezone(&Utc));
            }
        }
        if let Some(pageid) = raw.payload.get("pageid").and_then(Value::as_u64) {
            item = item.with_metadata("pageid", pageid.to_string());
        }

        Some(item)
    }
}
