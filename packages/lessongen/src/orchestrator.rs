//! Content orchestrator: multi-source fetch with caching, dedup, and
//! ranking.
//!
//! Coordinates the selector, adapters, and cache to produce a
//! deduplicated, ranked set of normalized content for a topic. A failing
//! source is recorded and skipped; the call fails only when every
//! selected source fails.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::{fingerprint, TtlCache};
use crate::error::{PipelineError, Result};
use crate::registry::ApiRegistry;
use crate::selector::SourceSelector;
use crate::traits::adapter::SourceAdapter;
use crate::types::config::{CacheConfig, FetchOptions};
use crate::types::content::NormalizedContent;

/// Shared content cache keyed by (source, topic, limit) fingerprints.
pub type ContentCache = TtlCache<Vec<NormalizedContent>>;

/// Coordinates registry, selector, adapters, and cache.
pub struct ContentOrchestrator {
    registry: Arc<ApiRegistry>,
    selector: SourceSelector,
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    cache: Arc<ContentCache>,
    cache_config: CacheConfig,
}

impl ContentOrchestrator {
    /// Create an orchestrator with no adapters registered yet.
    pub fn new(registry: Arc<ApiRegistry>, selector: SourceSelector) -> Self {
        Self {
            registry,
            selector,
            adapters: HashMap::new(),
            cache: Arc::new(ContentCache::new()),
            cache_config: CacheConfig::default(),
        }
    }

    /// Register an adapter under its source id.
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters
            .insert(adapter.source().id().to_string(), adapter);
        self
    }

    /// Replace the cache TTL configuration.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Share an existing cache (e.g. across orchestrators in tests).
    pub fn with_cache(mut self, cache: Arc<ContentCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Handle to the content cache, for sweeps and explicit invalidation.
    pub fn cache(&self) -> Arc<ContentCache> {
        Arc::clone(&self.cache)
    }

    /// Fetch, deduplicate, and rank content for a topic.
    ///
    /// See module docs for the algorithm. Result ordering is
    /// deterministic given identical inputs and cache state.
    pub async fn fetch_multi_source(
        &self,
        field: &str,
        topic: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<NormalizedContent>> {
        let selected = self.selector.select(topic, field, opts.num_sources).await;

        // Catalog entries without a shipped adapter are skipped.
        let mut sources: Vec<String> = Vec::new();
        for id in selected {
            if self.adapters.contains_key(&id) {
                sources.push(id);
            } else {
                debug!(source = %id, "selected source has no registered adapter, skipping");
            }
        }

        if sources.is_empty() {
            return Err(PipelineError::NoContentAvailable {
                topic: topic.to_string(),
            });
        }

        info!(field, topic, sources = ?sources, "multi-source fetch starting");

        // Cache probe per source; misses go to the network.
        let mut collected: Vec<NormalizedContent> = Vec::new();
        let mut misses: Vec<String> = Vec::new();
        let mut succeeded = 0usize;
        let mut failed: Vec<String> = Vec::new();

        for id in &sources {
            let key = Self::cache_key(id, topic, opts.items_per_source);
            match opts.use_cache.then(|| self.cache.get(&key)).flatten() {
                Some(items) => {
                    debug!(source = %id, items = items.len(), "cache hit");
                    collected.extend(items);
                    succeeded += 1;
                }
                None => misses.push(id.clone()),
            }
        }

        if !misses.is_empty() {
            let semaphore = Arc::new(Semaphore::new(opts.concurrency));
            let mut tasks = FuturesUnordered::new();

            for id in misses {
                let adapter = Arc::clone(&self.adapters[&id]);
                let semaphore = Arc::clone(&semaphore);
                let topic = topic.to_string();
                let limit = opts.items_per_source;

                tasks.push(tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("orchestrator semaphore is never closed");
                    let result = adapter.fetch_and_normalize(&topic, limit).await;
                    (id, result)
                }));
            }

            let deadline = opts
                .deadline
                .map(|d| tokio::time::Instant::now() + d);

            loop {
                let next = match deadline {
                    Some(at) => match tokio::time::timeout_at(at, tasks.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            warn!(
                                topic,
                                in_flight = tasks.len(),
                                "fetch deadline reached, abandoning in-flight sources"
                            );
                            break;
                        }
                    },
                    None => tasks.next().await,
                };

                let Some(joined) = next else { break };
                match joined {
                    Ok((id, Ok(items))) => {
                        debug!(source = %id, items = items.len(), "source fetch succeeded");
                        if opts.use_cache {
                            self.cache.set(
                                Self::cache_key(&id, topic, opts.items_per_source),
                                items.clone(),
                                self.cache_config.ttl_for(&id),
                            );
                        }
                        collected.extend(items);
                        succeeded += 1;
                    }
                    Ok((id, Err(err))) => {
                        warn!(source = %id, error = %err, "source fetch failed, skipping");
                        failed.push(id);
                    }
                    Err(join_err) => {
                        warn!(error = %join_err, "source fetch task aborted");
                    }
                }
            }

            // Abandoned tasks release their connections on abort.
            for task in tasks.iter() {
                task.abort();
            }
        }

        if succeeded == 0 {
            return Err(PipelineError::NoContentAvailable {
                topic: topic.to_string(),
            });
        }

        let ranked = self.rank_and_dedup(collected);
        let cap = opts.num_sources * opts.items_per_source;
        let result: Vec<NormalizedContent> = ranked.into_iter().take(cap).collect();

        info!(
            topic,
            sources_ok = succeeded,
            sources_failed = failed.len(),
            items = result.len(),
            "multi-source fetch complete"
        );
        Ok(result)
    }

    /// Explicitly drop the cached entry for one source and topic.
    pub fn invalidate(&self, source_id: &str, topic: &str, items_per_source: usize) {
        self.cache
            .invalidate(&Self::cache_key(source_id, topic, items_per_source));
    }

    fn cache_key(source_id: &str, topic: &str, limit: usize) -> String {
        fingerprint("fetch", &[source_id, topic, &limit.to_string()])
    }

    /// Rank by recency, then registry declaration order, then title key,
    /// and drop case-insensitive title duplicates keeping the best-ranked.
    fn rank_and_dedup(&self, items: Vec<NormalizedContent>) -> Vec<NormalizedContent> {
        let mut items = items;
        items.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| {
                    let pa = self.registry.position(a.source.id()).unwrap_or(usize::MAX);
                    let pb = self.registry.position(b.source.id()).unwrap_or(usize::MAX);
                    pa.cmp(&pb)
                })
                .then_with(|| a.title_key().cmp(&b.title_key()))
        });

        let mut seen: HashSet<String> = HashSet::new();
        items.retain(|item| seen.insert(item.title_key()));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAdapter;
    use std::time::Duration;

    fn orchestrator(adapters: Vec<MockAdapter>) -> ContentOrchestrator {
        let registry = Arc::new(ApiRegistry::builtin());
        let selector = SourceSelector::new(Arc::clone(&registry));
        let mut orch = ContentOrchestrator::new(registry, selector);
        for adapter in adapters {
            orch = orch.with_adapter(Arc::new(adapter));
        }
        orch
    }

    // Mocks register under builtin catalog ids so the selector's
    // static ranking resolves to them. For "physics" the ranked
    // candidates are [arxiv, wikipedia, openlibrary, stackexchange];
    // for "history" the top candidate is wikipedia.
    fn named(id: &str, items: usize) -> MockAdapter {
        MockAdapter::new(id).with_items(items)
    }

    #[tokio::test]
    async fn test_merges_and_caps_results() {
        let orch = orchestrator(vec![
            named("arxiv", 2),
            named("wikipedia", 2),
            named("openlibrary", 2),
        ]);
        let opts = FetchOptions::new().with_num_sources(3).with_items_per_source(2);

        let items = orch.fetch_multi_source("physics", "entropy", &opts).await.unwrap();
        assert_eq!(items.len(), 6); // No duplicate titles among distinct mocks
    }

    #[tokio::test]
    async fn test_dedup_across_sources() {
        let a = MockAdapter::new("wikipedia").with_titles(["Quantum Computing"]);
        let b = MockAdapter::new("arxiv").with_titles(["quantum computing"]);
        let orch = orchestrator(vec![a, b]);
        let opts = FetchOptions::new().with_num_sources(2).with_items_per_source(1);

        let items = orch.fetch_multi_source("physics", "qc", &opts).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_tolerated() {
        let orch = orchestrator(vec![
            named("wikipedia", 2),
            MockAdapter::new("arxiv").failing(),
        ]);
        let opts = FetchOptions::new().with_num_sources(2).with_items_per_source(2);

        let items = orch.fetch_multi_source("physics", "entropy", &opts).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_all_sources_failed() {
        let orch = orchestrator(vec![
            MockAdapter::new("wikipedia").failing(),
            MockAdapter::new("arxiv").failing(),
        ]);
        let opts = FetchOptions::new().with_num_sources(2).with_items_per_source(2);

        let err = orch
            .fetch_multi_source("physics", "entropy", &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoContentAvailable { .. }));
    }

    #[tokio::test]
    async fn test_no_registered_adapters_for_selection() {
        let orch = orchestrator(vec![]);
        let opts = FetchOptions::new();

        let err = orch
            .fetch_multi_source("physics", "entropy", &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoContentAvailable { .. }));
    }

    #[tokio::test]
    async fn test_cache_idempotence_issues_no_second_fetch() {
        let wikipedia = named("wikipedia", 2);
        let arxiv = named("arxiv", 2);
        let wiki_calls = wikipedia.call_count_handle();
        let arxiv_calls = arxiv.call_count_handle();

        let orch = orchestrator(vec![wikipedia, arxiv]);
        let opts = FetchOptions::new().with_num_sources(2).with_items_per_source(2);

        let first = orch.fetch_multi_source("physics", "entropy", &opts).await.unwrap();
        let second = orch.fetch_multi_source("physics", "entropy", &opts).await.unwrap();

        assert_eq!(*wiki_calls.lock().unwrap(), 1);
        assert_eq!(*arxiv_calls.lock().unwrap(), 1);

        let first_titles: Vec<&str> = first.iter().map(|i| i.title.as_str()).collect();
        let second_titles: Vec<&str> = second.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(first_titles, second_titles);
    }

    #[tokio::test]
    async fn test_use_cache_false_always_fetches() {
        let wikipedia = named("wikipedia", 1);
        let calls = wikipedia.call_count_handle();
        let orch = orchestrator(vec![wikipedia]);
        let opts = FetchOptions::new()
            .with_num_sources(1)
            .with_items_per_source(1)
            .without_cache();

        orch.fetch_multi_source("history", "entropy", &opts).await.unwrap();
        orch.fetch_multi_source("history", "entropy", &opts).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let wikipedia = named("wikipedia", 1);
        let calls = wikipedia.call_count_handle();
        let orch = orchestrator(vec![wikipedia]);
        let opts = FetchOptions::new().with_num_sources(1).with_items_per_source(1);

        orch.fetch_multi_source("history", "entropy", &opts).await.unwrap();
        orch.invalidate("wikipedia", "entropy", 1);
        orch.fetch_multi_source("history", "entropy", &opts).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ranking_prefers_recent_items() {
        // Mock items age by index: item 0 is newest.
        let orch = orchestrator(vec![named("wikipedia", 3)]);
        let opts = FetchOptions::new().with_num_sources(1).with_items_per_source(3);

        let items = orch.fetch_multi_source("history", "entropy", &opts).await.unwrap();
        let timestamps: Vec<_> = items.iter().map(|i| i.published_at.unwrap()).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(timestamps, sorted);
    }

    #[tokio::test]
    async fn test_deadline_keeps_completed_results() {
        /// Adapter that never completes within the deadline.
        struct StallAdapter;

        #[async_trait::async_trait]
        impl SourceAdapter for StallAdapter {
            fn source(&self) -> crate::types::content::ContentSource {
                crate::types::content::ContentSource::Other("arxiv".to_string())
            }
            fn source_type(&self) -> crate::types::content::SourceType {
                crate::types::content::SourceType::Paper
            }
            async fn fetch(
                &self,
                _query: &str,
                _limit: usize,
            ) -> crate::error::AdapterResult<Vec<crate::types::content::RawItem>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
            fn normalize(
                &self,
                _raw: &crate::types::content::RawItem,
            ) -> Option<NormalizedContent> {
                None
            }
        }

        let registry = Arc::new(ApiRegistry::builtin());
        let selector = SourceSelector::new(Arc::clone(&registry));
        let orch = ContentOrchestrator::new(registry, selector)
            .with_adapter(Arc::new(named("wikipedia", 2)))
            .with_adapter(Arc::new(StallAdapter));

        let opts = FetchOptions::new()
            .with_num_sources(2)
            .with_items_per_source(2)
            .with_deadline(Duration::from_millis(200));

        let items = orch.fetch_multi_source("physics", "entropy", &opts).await.unwrap();
        // The stalled source is abandoned; the fast one's results remain.
        assert_eq!(items.len(), 2);
    }
}
