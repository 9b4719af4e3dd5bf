//! Rate-limited adapter wrapper.
//!
//! Wraps any SourceAdapter with rate limiting using the governor crate,
//! keeping in-flight calls to one upstream API under its documented
//! limit.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::AdapterResult;
use crate::traits::adapter::SourceAdapter;
use crate::types::content::{ContentSource, NormalizedContent, RawItem, SourceType};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// An adapter wrapper that enforces rate limits before each fetch.
pub struct RateLimitedAdapter<A: SourceAdapter> {
    inner: A,
    limiter: Arc<DefaultRateLimiter>,
}

impl<A: SourceAdapter> RateLimitedAdapter<A> {
    /// Create a new rate-limited adapter.
    ///
    /// # Arguments
    /// * `adapter` - The underlying adapter to wrap
    /// * `requests_per_second` - Maximum requests per second
    pub fn new(adapter: A, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        );
        Self {
            inner: adapter,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with burst support.
    pub fn with_burst(adapter: A, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        )
        .allow_burst(NonZeroU32::new(burst).expect("burst must be > 0"));

        Self {
            inner: adapter,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl<A: SourceAdapter> SourceAdapter for RateLimitedAdapter<A> {
    fn source(&self) -> ContentSource {
        self.inner.source()
    }

    fn source_type(&self) -> SourceType {
        self.inner.source_type()
    }

    async fn fetch(&self, query: &str, limit: usize) -> AdapterResult<Vec<RawItem>> {
        self.limiter.until_ready().await;
        self.inner.fetch(query, limit).await
    }

    fn normalize(&self, raw: &RawItem) -> Option<NormalizedContent> {
        self.inner.normalize(raw)
    }
}

/// Extension trait for easy rate limiting.
pub trait AdapterExt: SourceAdapter + Sized {
    /// Wrap this adapter with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedAdapter<Self> {
        RateLimitedAdapter::new(self, requests_per_second)
    }

    /// Wrap with rate limiting and burst support.
    fn rate_limited_with_burst(
        self,
        requests_per_second: u32,
        burst: u32,
    ) -> RateLimitedAdapter<Self> {
        RateLimitedAdapter::with_burst(self, requests_per_second, burst)
    }
}

impl<A: SourceAdapter + Sized> AdapterExt for A {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAdapter;
    use std::time::Instant;

    #[tokio::test]
    async fn test_rate_limiting_delays_requests() {
        let mock = MockAdapter::new("slow-api").with_items(1);
        let adapter = mock.rate_limited(2);

        let start = Instant::now();
        for _ in 0..3 {
            adapter.fetch("topic", 1).await.unwrap();
        }
        let elapsed = start.elapsed();

        // 3 requests at 2/sec: first immediate, the rest wait.
        assert!(
            elapsed.as_millis() >= 500,
            "rate limiting not applied: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_wrapper_preserves_identity() {
        let mock = MockAdapter::new("wrapped").with_items(2);
        let adapter = mock.rate_limited_with_burst(10, 20);

        assert_eq!(adapter.source().id(), "wrapped");
        let items = adapter.fetch_and_normalize("topic", 2).await.unwrap();
        assert_eq!(items.len(), 2);
    }
}
