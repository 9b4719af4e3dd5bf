//! Content types shared by adapters and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of an external content source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Wikipedia,
    Arxiv,
    HackerNews,
    /// A source registered at runtime without a built-in variant.
    Other(String),
}

impl ContentSource {
    /// Stable string id, matching the registry catalog.
    pub fn id(&self) -> &str {
        match self {
            Self::Wikipedia => "wikipedia",
            Self::Arxiv => "arxiv",
            Self::HackerNews => "hackernews",
            Self::Other(id) => id,
        }
    }

    /// Parse a source id back into its variant.
    pub fn from_id(id: &str) -> Self {
        match id {
            "wikipedia" => Self::Wikipedia,
            "arxiv" => Self::Arxiv,
            "hackernews" => Self::HackerNews,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// What kind of material a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Article,
    Paper,
    Post,
    Reference,
}

/// A raw item as returned by a source's API, before normalization.
///
/// The payload keeps the source's own wire shape; only `normalize` knows
/// how to interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    /// Id of the source that produced this item
    pub source_id: String,

    /// Source-shaped payload
    pub payload: serde_json::Value,
}

impl RawItem {
    /// Create a raw item for a source.
    pub fn new(source_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source_id: source_id.into(),
            payload,
        }
    }
}

/// A normalized piece of content, the common currency of the pipeline.
///
/// Invariant: `title` and `content` are non-empty. Construction goes
/// through [`NormalizedContent::new`], which owns that check at the
/// adapter boundary; the orchestrator never re-validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedContent {
    /// Which source produced this content
    pub source: ContentSource,

    /// Kind of material (article, paper, post, ...)
    pub source_type: SourceType,

    /// Item title
    pub title: String,

    /// Body text (markup already stripped by the adapter)
    pub content: String,

    /// Canonical URL if the source provides one
    pub url: Option<String>,

    /// Publication or last-modified timestamp if known
    pub published_at: Option<DateTime<Utc>>,

    /// Source-specific extras (scores, authors, categories)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl NormalizedContent {
    /// Create normalized content. Returns `None` when `title` or `content`
    /// is empty after trimming, which callers treat as a malformed item.
    pub fn new(
        source: ContentSource,
        source_type: SourceType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() || content.trim().is_empty() {
            return None;
        }
        Some(Self {
            source,
            source_type,
            title,
            content,
            url: None,
            published_at: None,
            metadata: HashMap::new(),
        })
    }

    /// Set the canonical URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the publication timestamp.
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive dedup key for the title.
    ///
    /// Lowercases, collapses runs of non-alphanumerics to single spaces,
    /// and trims. Two items with the same key are considered duplicates.
    pub fn title_key(&self) -> String {
        let mut key = String::with_capacity(self.title.len());
        let mut last_was_space = true;
        for c in self.title.chars() {
            if c.is_alphanumeric() {
                key.extend(c.to_lowercase());
                last_was_space = false;
            } else if !last_was_space {
                key.push(' ');
                last_was_space = true;
            }
        }
        key.trim_end().to_string()
    }
}
