//! In-memory lesson store for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::traits::store::LessonStore;
use crate::types::lesson::LessonRecord;

/// In-memory storage for lesson records.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryLessonStore {
    lessons: RwLock<HashMap<Uuid, LessonRecord>>,
}

impl Default for MemoryLessonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLessonStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            lessons: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored lessons.
    pub fn lesson_count(&self) -> usize {
        self.lessons.read().unwrap().len()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.lessons.write().unwrap().clear();
    }
}

#[async_trait]
impl LessonStore for MemoryLessonStore {
    async fn upsert_lessons(&self, records: &[LessonRecord]) -> Result<Vec<LessonRecord>> {
        let mut lessons = self.lessons.write().unwrap();
        for record in records {
            lessons.insert(record.id, record.clone());
        }
        Ok(records.to_vec())
    }

    async fn get_lesson(&self, id: Uuid) -> Result<Option<LessonRecord>> {
        Ok(self.lessons.read().unwrap().get(&id).cloned())
    }

    async fn lessons_for_field(&self, field_id: &str) -> Result<Vec<LessonRecord>> {
        let mut records: Vec<LessonRecord> = self
            .lessons
            .read()
            .unwrap()
            .values()
            .filter(|r| r.field_id == field_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lesson::QuizQuestion;
    use chrono::Utc;

    fn record(field: &str, topic: &str) -> LessonRecord {
        LessonRecord {
            id: Uuid::new_v4(),
            field_id: field.to_string(),
            topic: topic.to_string(),
            title: topic.to_string(),
            content: "body".to_string(),
            objectives: vec!["objective".to_string()],
            quiz: vec![QuizQuestion {
                question: "q?".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                answer_index: 0,
                explanation: None,
            }],
            flashcards: vec![],
            image_url: None,
            audio_url: None,
            provenance: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = MemoryLessonStore::new();
        let rec = record("physics", "entropy");
        let id = rec.id;

        store.upsert_lessons(&[rec]).await.unwrap();
        assert_eq!(store.lesson_count(), 1);

        let fetched = store.get_lesson(id).await.unwrap().unwrap();
        assert_eq!(fetched.topic, "entropy");
    }

    #[tokio::test]
    async fn test_upsert_same_id_replaces() {
        let store = MemoryLessonStore::new();
        let mut rec = record("physics", "entropy");
        store.upsert_lessons(std::slice::from_ref(&rec)).await.unwrap();

        rec.title = "Updated".to_string();
        store.upsert_lessons(&[rec.clone()]).await.unwrap();

        assert_eq!(store.lesson_count(), 1);
        let fetched = store.get_lesson(rec.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Updated");
    }

    #[tokio::test]
    async fn test_lessons_for_field_filters() {
        let store = MemoryLessonStore::new();
        store
            .upsert_lessons(&[
                record("physics", "entropy"),
                record("physics", "heat"),
                record("history", "rome"),
            ])
            .await
            .unwrap();

        let physics = store.lessons_for_field("physics").await.unwrap();
        assert_eq!(physics.len(), 2);
    }
}
