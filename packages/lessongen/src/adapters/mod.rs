//! Source adapter implementations.
//!
//! One adapter per external content source, all behind the
//! [`crate::traits::SourceAdapter`] trait. `RateLimitedAdapter` wraps
//! any of them with a governor-backed rate limit.

pub mod arxiv;
pub mod hackernews;
pub mod rate_limited;
pub mod wikipedia;

pub use arxiv::ArxivAdapter;
pub use hackernews::HackerNewsAdapter;
pub use rate_limited::{AdapterExt, RateLimitedAdapter};
pub use wikipedia::WikipediaAdapter;
