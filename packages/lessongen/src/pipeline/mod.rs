//! Lesson generation pipeline.

pub mod generate;

pub use generate::GenerationPipeline;
