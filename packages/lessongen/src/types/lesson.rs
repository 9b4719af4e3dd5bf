//! Lesson generation request and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to generate lesson material for a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Field of study (e.g. "computer-science")
    pub field: String,

    /// Topic within the field (e.g. "quantum computing")
    pub topic: String,

    /// Minimum number of quiz questions the result must carry
    pub num_quiz_questions: usize,

    /// Number of flashcards to attempt (flashcards are optional output)
    pub num_flashcards: usize,

    /// Maximum lesson body length in words
    pub max_words: usize,
}

impl GenerationRequest {
    /// Create a request with default item counts.
    pub fn new(field: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            topic: topic.into(),
            num_quiz_questions: 5,
            num_flashcards: 8,
            max_words: 600,
        }
    }

    /// Set the quiz question count.
    pub fn with_quiz_questions(mut self, n: usize) -> Self {
        self.num_quiz_questions = n;
        self
    }

    /// Set the flashcard count.
    pub fn with_flashcards(mut self, n: usize) -> Self {
        self.num_flashcards = n;
        self
    }

    /// Set the word budget for the lesson body.
    pub fn with_max_words(mut self, n: usize) -> Self {
        self.max_words = n;
        self
    }
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Structural validity: non-empty question, 2+ options, answer in range.
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() >= 2
            && self.answer_index < self.options.len()
    }
}

/// A front/back flashcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn is_valid(&self) -> bool {
        !self.front.trim().is_empty() && !self.back.trim().is_empty()
    }
}

/// Output of a media collaborator. The pipeline never depends on a
/// specific provider succeeding; failures degrade to `None` media fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaResult {
    pub success: bool,
    pub url: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl MediaResult {
    /// Successful result pointing at a hosted asset.
    pub fn ok(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            provider: provider.into(),
            error: None,
        }
    }

    /// Failed result carrying the provider's error.
    pub fn failed(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            provider: provider.into(),
            error: Some(error.into()),
        }
    }
}

/// A fully generated lesson, ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    /// Stable record id (upsert key)
    pub id: Uuid,

    /// Field of study this lesson belongs to
    pub field_id: String,

    /// Topic the lesson covers
    pub topic: String,

    /// Lesson title
    pub title: String,

    /// Lesson body (markdown)
    pub content: String,

    /// Learning objectives (at least one required)
    pub objectives: Vec<String>,

    /// Quiz questions
    pub quiz: Vec<QuizQuestion>,

    /// Flashcards (optional output, may be empty)
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,

    /// Hosted image URL, if an image collaborator succeeded
    pub image_url: Option<String>,

    /// Hosted audio URL, if an audio collaborator succeeded
    pub audio_url: Option<String>,

    /// Ids of the sources the lesson was synthesized from
    pub provenance: Vec<String>,

    /// When the record was generated
    pub created_at: DateTime<Utc>,
}

impl LessonRecord {
    /// Check the required-field invariant before persistence.
    ///
    /// A record is persistable iff title, content, and at least one
    /// objective are present and the quiz meets the requested minimum.
    /// Media and flashcards are optional by contract.
    pub fn meets_minimum(&self, min_quiz_questions: usize) -> bool {
        !self.title.trim().is_empty()
            && !self.content.trim().is_empty()
            && !self.objectives.is_empty()
            && self.quiz.len() >= min_quiz_questions
            && self.quiz.iter().all(QuizQuestion::is_valid)
    }

    /// Whether any optional field is missing (degraded but valid result).
    pub fn is_degraded(&self) -> bool {
        self.image_url.is_none() || self.audio_url.is_none() || self.flashcards.is_empty()
    }
}
