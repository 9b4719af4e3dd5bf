//! Data types for content acquisition and lesson generation.

pub mod config;
pub mod content;
pub mod lesson;

pub use config::{CacheConfig, ChainConfig, FetchOptions};
pub use content::{ContentSource, NormalizedContent, RawItem, SourceType};
pub use lesson::{
    Flashcard, GenerationRequest, LessonRecord, MediaResult, QuizQuestion,
};
