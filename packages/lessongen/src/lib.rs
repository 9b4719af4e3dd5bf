//! Content Acquisition and Lesson Generation Library
//!
//! Ingests raw material from heterogeneous external content sources,
//! normalizes it, and drives a multi-stage generation pipeline that
//! turns it into structured lesson material (text, quiz, flashcards)
//! through LLM calls that tolerate provider failure.
//!
//! # Design
//!
//! - Sources are pluggable: implement [`SourceAdapter`] per API
//! - Fetches are cached under per-source TTLs; only full successes
//!   are cached, so an outage never poisons the TTL window
//! - LLM providers sit in an ordered fallback chain; a request fails
//!   only when every provider is exhausted
//! - Optional stages (flashcards, media) degrade the result rather
//!   than aborting it
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lessongen::{
//!     ApiRegistry, ContentOrchestrator, GenerationPipeline, GenerationRequest,
//!     FetchOptions, MemoryLessonStore, ProviderChain, SourceSelector,
//!     WikipediaAdapter, ArxivAdapter,
//! };
//!
//! let registry = Arc::new(ApiRegistry::builtin());
//! let selector = SourceSelector::new(Arc::clone(&registry));
//! let orchestrator = Arc::new(
//!     ContentOrchestrator::new(registry, selector)
//!         .with_adapter(Arc::new(WikipediaAdapter::new()))
//!         .with_adapter(Arc::new(ArxivAdapter::new())),
//! );
//!
//! let chain = Arc::new(ProviderChain::new(providers));
//! let pipeline = GenerationPipeline::new(orchestrator, chain, store);
//! let request = GenerationRequest::new("physics", "entropy");
//! let record = pipeline.generate_lesson(&request, &FetchOptions::new()).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (SourceAdapter, LlmProvider, ...)
//! - [`types`] - Content and lesson data types
//! - [`adapters`] - Source adapter implementations
//! - [`cache`] - TTL cache with deterministic fingerprints
//! - [`registry`] / [`selector`] - API catalog and selection policy
//! - [`llm`] - Provider chain with fallback and typed tasks
//! - [`orchestrator`] - Multi-source fetch, dedup, ranking
//! - [`pipeline`] - Lesson generation pipeline
//! - [`stores`] - Persistence implementations
//! - [`testing`] - Mock implementations for testing

pub mod adapters;
pub mod cache;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod selector;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    AdapterError, AdapterResult, GenerationError, PipelineError, ProviderError, ProviderResult,
    Result,
};
pub use traits::{
    adapter::SourceAdapter,
    media::{MediaGenerator, MediaKind},
    provider::{ChatMessage, Completion, CompletionParams, LlmProvider},
    store::LessonStore,
};
pub use types::{
    config::{CacheConfig, ChainConfig, FetchOptions},
    content::{ContentSource, NormalizedContent, RawItem, SourceType},
    lesson::{Flashcard, GenerationRequest, LessonRecord, MediaResult, QuizQuestion},
};

// Re-export adapters
pub use adapters::{
    AdapterExt, ArxivAdapter, HackerNewsAdapter, RateLimitedAdapter, WikipediaAdapter,
};

// Re-export cache
pub use cache::{fingerprint, TtlCache};

// Re-export registry and selector
pub use registry::{ApiDescriptor, ApiRegistry, Category, RateLimitInfo};
pub use selector::SourceSelector;

// Re-export the LLM chain
pub use llm::{CurriculumEntry, LessonDraft, OpenAiCompatProvider, ProviderChain};

// Re-export orchestration and pipeline
pub use orchestrator::{ContentCache, ContentOrchestrator};
pub use pipeline::GenerationPipeline;

// Re-export stores
pub use stores::MemoryLessonStore;

// Re-export testing utilities
pub use testing::{MockAdapter, MockMedia, MockOutcome, MockProvider};
