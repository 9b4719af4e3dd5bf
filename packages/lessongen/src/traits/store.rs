//! LessonStore trait for the persistence collaborator.
//!
//! The pipeline treats persistence purely as an idempotent
//! upsert-by-primary-key surface; it does not own migrations or schema.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::lesson::LessonRecord;

/// Persistence surface for generated lessons.
#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Upsert records by id, returning the stored records.
    async fn upsert_lessons(&self, records: &[LessonRecord]) -> Result<Vec<LessonRecord>>;

    /// Fetch a single lesson by id.
    async fn get_lesson(&self, id: Uuid) -> Result<Option<LessonRecord>>;

    /// All lessons for a field.
    async fn lessons_for_field(&self, field_id: &str) -> Result<Vec<LessonRecord>>;
}
