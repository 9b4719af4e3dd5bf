//! Core trait abstractions.
//!
//! - [`adapter`] - pluggable content sources
//! - [`provider`] - language-model backends
//! - [`media`] - external image/audio collaborators
//! - [`store`] - persistence collaborator

pub mod adapter;
pub mod media;
pub mod provider;
pub mod store;

pub use adapter::SourceAdapter;
pub use media::{MediaGenerator, MediaKind};
pub use provider::{ChatMessage, Completion, CompletionParams, LlmProvider};
pub use store::LessonStore;
