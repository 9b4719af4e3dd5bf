//! SourceAdapter trait for pluggable content sources.
//!
//! Each external content source (encyclopedia, preprint archive, forum)
//! implements this trait. New sources are added by implementing the trait,
//! never by branching on source kind.

use async_trait::async_trait;
use tracing::warn;

use crate::error::AdapterResult;
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};

/// A pluggable content source.
///
/// Implementations fetch raw items from one external API and normalize
/// them into [`NormalizedContent`]. Adapters own no shared state; each
/// call builds its own scoped network client.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The fixed identity of this source.
    fn source(&self) -> ContentSource;

    /// The kind of material this source produces.
    fn source_type(&self) -> SourceType;

    /// Fetch up to `limit` raw items matching `query`.
    ///
    /// Network failure (timeout, non-2xx) surfaces as an `AdapterError`
    /// carrying this source's id. It does not propagate past the
    /// orchestrator, which treats it as zero results from this source.
    async fn fetch(&self, query: &str, limit: usize) -> AdapterResult<Vec<RawItem>>;

    /// Normalize one raw item.
    ///
    /// Returns `None` for malformed items (missing title or body); the
    /// batch-level methods skip those rather than failing.
    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent>;

    /// Fetch and normalize in one step.
    ///
    /// Malformed items are skipped with a warning, never fatal to the
    /// batch. Returns between 0 and `limit` items.
    async fn fetch_and_normalize(
        &self,
        query: &str,
        limit: usize,
    ) -> AdapterResult<Vec<NormalizedContent>> {
        let raw = self.fetch(query, limit).await?;
        let mut items = Vec::with_capacity(raw.len());
        for item in &raw {
            match self.normalize(item) {
                Some(normalized) => items.push(normalized),
                None => {
                    warn!(
                        source = %self.source(),
                        "skipping malformed item from source"
                    );
                }
            }
        }
        items.truncate(limit);
        Ok(items)
    }
}
