//! arXiv adapter (Atom query API).
//!
//! The export API speaks Atom XML; entries are extracted with the same
//! lightweight regex approach used for markup stripping elsewhere rather
//! than pulling in a full XML parser.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::traits::adapter::SourceAdapter;
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};

const DEFAULT_ENDPOINT: &str = "http://export.arxiv.org/api/query";

/// Fetches paper abstracts from the arXiv export API.
pub struct ArxivAdapter {
    endpoint: String,
    timeout: Duration,
}

impl Default for ArxivAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArxivAdapter {
    /// Create an adapter against the live export API.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
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

    /// Pull one tag's text out of an entry block.
    fn tag_text(entry: &str, tag: &str) -> Option<String> {
        let pattern = regex::Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")).ok()?;
        pattern
            .captures(entry)
            .and_then(|cap| cap.get(1))
            .map(|m| collapse_whitespace(m.as_str()))
    }

    /// Split an Atom feed into entry payloads.
    fn parse_feed(&self, xml: &str) -> Vec<RawItem> {
        let entry_pattern = regex::Regex::new(r"(?s)<entry>(.*?)</entry>")
            .expect("static pattern");

        entry_pattern
            .captures_iter(xml)
            .filter_map(|cap| cap.get(1))
            .map(|entry| {
                let entry = entry.as_str();
                RawItem::new(
                    self.source_id(),
                    json!({
                        "title": Self::tag_text(entry, "title"),
                        "summary": Self::tag_text(entry, "summary"),
                        "id": Self::tag_text(entry, "id"),
                        "published": Self::tag_text(entry, "published"),
                    }),
                )
            })
            .collect()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn source(&self) -> ContentSource {
        ContentSource::Arxiv
    }

    fn source_type(&self) -> SourceType {
        SourceType::Paper
    }

    async fn fetch(&self, query: &str, limit: usize) -> AdapterResult<Vec<RawItem>> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AdapterError::Http {
                source_id: self.source_id(),
                message: e.to_string(),
            })?;

        let search_query = format!("all:{query}");
        let max_results = limit.min(30).to_string();
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
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

        let xml = response.text().await.map_err(|e| AdapterError::BadResponse {
            source_id: self.source_id(),
            reason: e.to_string(),
        })?;

        let items = self.parse_feed(&xml);
        debug!(query, count = items.len(), "arxiv fetch complete");
        Ok(items)
    }

    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent> {
        let title = raw.payload.get("title")?.as_str()?;
        let summary = raw.payload.get("summary")?.as_str()?;

        let mut item =
            NormalizedContent::new(self.source(), self.source_type(), title, summary)?;

        if let Some(id_url) = raw.payload.get("id").and_then(Value::as_str) {
            item = item.with_url(id_url);
        }
        if let Some(published) = raw.payload.get("published").and_then(Value::as_str) {
            if let Ok(ts) = DateTime::parse_from_rfc3339(published) {
                item = item.with_published_at(ts.with_timezone(&Utc));
            }
        }

        Some(item)
    }
}
