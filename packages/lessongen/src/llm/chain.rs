//! Ordered provider chain with automatic fallback.
//!
//! Providers are tried in priority order; an attempt fails over on
//! timeout, rate-limit, or transport error. Total attempts are hard
//! capped at providers x attempts_per_provider.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::provider::{ChatMessage, Completion, CompletionParams, LlmProvider};
use crate::types::config::ChainConfig;

/// An ordered list of language-model providers tried in sequence.
pub struct ProviderChain {
    providers: Vec<Arc<dyn LlmProvider>>,
    config: ChainConfig,
}

impl ProviderChain {
    /// Create a chain. Order is priority order: put the free-tier
    /// provider first, the paid one second.
    ///
    /// An empty chain is allowed; every `complete` call on it fails
    /// immediately with [`ProviderError::ChainExhausted`] carrying zero
    /// attempts and no provider names.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self {
            providers,
            config: ChainConfig::default(),
        }
    }

    /// Replace the chain configuration.
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Issue a completion, failing over through the chain.
    ///
    /// Returns the first successful completion, tagged with the identity
    /// of the provider that produced it. When every provider is
    /// exhausted, returns [`ProviderError::ChainExhausted`] naming each
    /// attempted provider.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> ProviderResult<Completion> {
        let budget = self.providers.len() * self.config.attempts_per_provider;
        let mut attempts = 0usize;
        let mut attempted: Vec<String> = Vec::new();

        for provider in &self.providers {
            if !attempted.iter().any(|id| id == provider.id()) {
                attempted.push(provider.id().to_string());
            }

            for local_attempt in 0..self.config.attempts_per_provider {
                if attempts >= budget {
                    break;
                }
                attempts += 1;

                let start = Instant::now();
                let outcome = tokio::time::timeout(
                    self.config.attempt_timeout,
                    provider.complete(messages, params),
                )
                .await;
                let latency = start.elapsed();

                match outcome {
                    Ok(Ok(completion)) => {
                        info!(
                            provider = provider.id(),
                            latency_ms = latency.as_millis() as u64,
                            attempt = attempts,
                            outcome = "success",
                            "provider attempt"
                        );
                        return Ok(completion);
                    }
                    Ok(Err(err)) => {
                        warn!(
                            provider = provider.id(),
                            latency_ms = latency.as_millis() as u64,
                            attempt = attempts,
                            outcome = %err,
                            "provider attempt failed"
                        );
                        // Back off before hammering a rate-limited provider again.
                        if matches!(err, ProviderError::RateLimited { .. }) {
                            let backoff =
                                Duration::from_millis(250 * (local_attempt as u64 + 1));
                            debug!(
                                provider = provider.id(),
                                backoff_ms = backoff.as_millis() as u64,
                                "rate limited, backing off"
                            );
                            tokio::time::sleep(backoff).await;
                        }
                    }
                    Err(_elapsed) => {
                        warn!(
                            provider = provider.id(),
                            latency_ms = latency.as_millis() as u64,
                            attempt = attempts,
                            outcome = "timeout",
                            "provider attempt timed out"
                        );
                    }
                }
            }
        }

        Err(ProviderError::ChainExhausted {
            attempts,
            attempted,
        })
    }
}
