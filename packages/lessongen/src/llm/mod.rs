//! LLM provider chain: ordered fallback plus typed generation tasks.

pub mod chain;
pub mod openai_compat;
pub mod prompts;
pub mod tasks;

pub use chain::ProviderChain;
pub use openai_compat::OpenAiCompatProvider;
pub use tasks::{CurriculumEntry, LessonDraft};
