//! Storage implementations for the persistence collaborator.

pub mod memory;

pub use memory::MemoryLessonStore;
