//! Typed errors for the lesson generation library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors surfaced by the generation pipeline and orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every selected source failed for this topic.
    #[error("no content available for topic: {topic}")]
    NoContentAvailable { topic: String },

    /// A required generation step failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// LLM provider chain exhausted.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Storage operation failed.
    #[error("persistence error: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid request parameters.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

/// Errors from a single source adapter.
///
/// Adapter errors are recoverable at the orchestrator layer: a failing
/// source is logged and skipped, never fatal to the batch.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed
    #[error("[{source_id}] HTTP error: {message}")]
    Http { source_id: String, message: String },

    /// Connection or read timeout
    #[error("[{source_id}] timeout fetching content")]
    Timeout { source_id: String },

    /// Upstream rate limit hit
    #[error("[{source_id}] rate limit exceeded")]
    RateLimited { source_id: String },

    /// Response body did not match the source's wire shape
    #[error("[{source_id}] bad response: {reason}")]
    BadResponse { source_id: String, reason: String },
}

impl AdapterError {
    /// The id of the source that produced this error.
    pub fn source_id(&self) -> &str {
        match self {
            Self::Http { source_id, .. }
            | Self::Timeout { source_id }
            | Self::RateLimited { source_id }
            | Self::BadResponse { source_id, .. } => source_id,
        }
    }
}

/// Errors from a single LLM provider attempt or from the whole chain.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider did not respond within its attempt timeout
    #[error("provider {provider_id} timed out")]
    Timeout { provider_id: String },

    /// Provider returned a rate-limit or quota error
    #[error("provider {provider_id} rate limited")]
    RateLimited { provider_id: String },

    /// Transport-level failure (connect error, non-2xx, bad payload)
    #[error("provider {provider_id} transport error: {message}")]
    Transport {
        provider_id: String,
        message: String,
    },

    /// All providers in the chain failed.
    #[error("provider chain exhausted after {attempts} attempts: [{}]", attempted.join(", "))]
    ChainExhausted {
        attempts: usize,
        attempted: Vec<String>,
    },
}

impl ProviderError {
    /// Whether this error should fail over to the next provider in the chain.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ChainExhausted { .. })
    }
}

/// Errors from typed generation tasks.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// LLM output failed structural validation after the local retry budget.
    #[error("task '{task}' produced malformed output: {reason}")]
    Shape { task: String, reason: String },

    /// The underlying provider chain was exhausted for this task.
    #[error("task '{task}' failed: {source}")]
    Chain {
        task: String,
        #[source]
        source: ProviderError,
    },
}

impl GenerationError {
    /// Name of the task that failed.
    pub fn task(&self) -> &str {
        match self {
            Self::Shape { task, .. } | Self::Chain { task, .. } => task,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
