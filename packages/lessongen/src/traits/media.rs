//! MediaGenerator trait for external image/audio collaborators.
//!
//! The pipeline treats media generation as best-effort: a failing
//! collaborator degrades the lesson record (the media field stays
//! `None`), it never aborts the request.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::lesson::MediaResult;

/// Kind of media a collaborator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// An external media generation capability.
#[async_trait]
pub trait MediaGenerator: Send + Sync {
    /// What this collaborator produces.
    fn kind(&self) -> MediaKind;

    /// Generate media for a prompt.
    ///
    /// Always returns a `MediaResult`; provider-side failure is reported
    /// through `success: false` rather than an error, so callers can
    /// uniformly fall back to "no media".
    async fn generate(&self, prompt: &str, options: &HashMap<String, String>) -> MediaResult;
}
