//! Typed generation tasks on top of the provider chain.
//!
//! Each helper builds a task prompt, requests JSON output, parses and
//! shape-validates the reply, and retries once with a corrective
//! instruction on shape failure. Shape failure never advances the
//! provider chain; chain exhaustion surfaces as a task-level error.

use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::llm::chain::ProviderChain;
use crate::llm::prompts;
use crate::traits::provider::{ChatMessage, CompletionParams};
use crate::types::content::NormalizedContent;
use crate::types::lesson::{Flashcard, QuizQuestion};

/// One planned lesson in a curriculum.
#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumEntry {
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurriculumResponse {
    lessons: Vec<CurriculumEntry>,
}

/// The synthesized lesson body before quiz/flashcard/media stages.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub objectives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
struct FlashcardResponse {
    cards: Vec<Flashcard>,
}

/// Strip markdown code fences that models wrap around JSON replies.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Parse a JSON reply into `T`, tolerating code fences.
pub(crate) fn parse_json_reply<T: DeserializeOwned>(content: &str) -> Result<T, String> {
    serde_json::from_str(strip_fences(content)).map_err(|e| e.to_string())
}

impl ProviderChain {
    /// Run one task: prompt, parse, validate, with a single corrective
    /// retry on shape failure.
    async fn run_task<T, R>(
        &self,
        task: &str,
        prompt: String,
        validate: impl Fn(&R) -> Result<(), String>,
        project: impl Fn(R) -> T,
    ) -> Result<T, GenerationError>
    where
        R: DeserializeOwned,
    {
        let params = CompletionParams::new().with_temperature(0.4).json();
        let mut messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        let mut last_reason = String::new();
        for attempt in 0..2 {
            let completion = self.complete(&messages, &params).await.map_err(|source| {
                GenerationError::Chain {
                    task: task.to_string(),
                    source,
                }
            })?;

            match parse_json_reply::<R>(&completion.content)
                .and_then(|parsed| validate(&parsed).map(|()| parsed))
            {
                Ok(parsed) => {
                    debug!(task, provider = %completion.provider_id, attempt, "task completed");
                    return Ok(project(parsed));
                }
                Err(reason) => {
                    warn!(task, attempt, reason = %reason, "shape validation failed");
                    last_reason = reason;
                    // Keep the bad reply in context so the corrective
                    // instruction has something to correct.
                    messages.push(ChatMessage::assistant(completion.content));
                    messages.push(ChatMessage::user(prompts::format_corrective_prompt(
                        &last_reason,
                    )));
                }
            }
        }

        Err(GenerationError::Shape {
            task: task.to_string(),
            reason: last_reason,
        })
    }

    /// Plan a curriculum of `num_lessons` lessons for a field.
    pub async fn generate_curriculum(
        &self,
        field: &str,
        num_lessons: usize,
    ) -> Result<Vec<CurriculumEntry>, GenerationError> {
        self.run_task(
            "curriculum",
            prompts::format_curriculum_prompt(field, num_lessons),
            move |r: &CurriculumResponse| {
                if r.lessons.is_empty() {
                    return Err("no lessons returned".to_string());
                }
                if r.lessons
                    .iter()
                    .any(|l| l.title.trim().is_empty() || l.topic.trim().is_empty())
                {
                    return Err("lesson with empty title or topic".to_string());
                }
                Ok(())
            },
            |r| r.lessons,
        )
        .await
    }

    /// Synthesize a lesson body from normalized source content.
    pub async fn synthesize_lesson(
        &self,
        contents: &[NormalizedContent],
        field: &str,
        max_words: usize,
    ) -> Result<LessonDraft, GenerationError> {
        self.run_task(
            "lesson-synthesis",
            prompts::format_lesson_prompt(contents, field, max_words),
            |r: &LessonDraft| {
                if r.title.trim().is_empty() {
                    return Err("empty title".to_string());
                }
                if r.content.trim().is_empty() {
                    return Err("empty content".to_string());
                }
                if r.objectives.iter().all(|o| o.trim().is_empty()) || r.objectives.is_empty() {
                    return Err("no learning objectives".to_string());
                }
                Ok(())
            },
            |r| r,
        )
        .await
    }

    /// Generate at least `num_questions` valid quiz questions.
    pub async fn generate_quiz(
        &self,
        content: &str,
        num_questions: usize,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        self.run_task(
            "quiz",
            prompts::format_quiz_prompt(content, num_questions),
            move |r: &QuizResponse| {
                if r.questions.len() < num_questions {
                    return Err(format!(
                        "expected at least {num_questions} questions, got {}",
                        r.questions.len()
                    ));
                }
                if let Some(bad) = r.questions.iter().find(|q| !q.is_valid()) {
                    return Err(format!("invalid question: {:?}", bad.question));
                }
                Ok(())
            },
            |r| r.questions,
        )
        .await
    }

    /// Generate at least one flashcard, aiming for `num_cards`.
    pub async fn generate_flashcards(
        &self,
        content: &str,
        num_cards: usize,
    ) -> Result<Vec<Flashcard>, GenerationError> {
        self.run_task(
            "flashcards",
            prompts::format_flashcard_prompt(content, num_cards),
            |r: &FlashcardResponse| {
                if r.cards.is_empty() {
                    return Err("no cards returned".to_string());
                }
                if r.cards.iter().any(|c| !c.is_valid()) {
                    return Err("card with empty side".to_string());
                }
                Ok(())
            },
            |r| r.cards,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOutcome, MockProvider};
    use crate::traits::provider::LlmProvider;
    use std::sync::Arc;

    fn single(provider: MockProvider) -> ProviderChain {
        ProviderChain::new(vec![Arc::new(provider) as Arc<dyn LlmProvider>])
    }

    fn quiz_json(n: usize) -> String {
        let questions: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"question":"Q{i}?","options":["a","b","c","d"],"answer_index":1}}"#
                )
            })
            .collect();
        format!(r#"{{"questions":[{}]}}"#, questions.join(","))
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
    }

    #[tokio::test]
    async fn test_quiz_happy_path() {
        let chain = single(MockProvider::new("p").with_reply(quiz_json(3)));
        let questions = chain.generate_quiz("body", 3).await.unwrap();
        assert_eq!(questions.len(), 3);
    }

    #[tokio::test]
    async fn test_quiz_below_minimum_retries_then_fails() {
        // Both replies are well-formed JSON but below the minimum count.
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(quiz_json(1)),
            MockOutcome::Reply(quiz_json(1)),
        ]);
        let calls = provider.call_count_handle();
        let chain = single(provider);

        let err = chain.generate_quiz("body", 3).await.unwrap_err();
        match err {
            GenerationError::Shape { task, .. } => assert_eq!(task, "quiz"),
            other => panic!("expected Shape error, got {other}"),
        }
        // One original attempt plus exactly one corrective retry.
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_shape_failure_does_not_advance_chain() {
        // Primary keeps answering with well-formed but below-minimum
        // quiz JSON; a healthy secondary must stay untouched because
        // shape failure is a task-level problem, not a provider one.
        let primary = MockProvider::new("primary").with_reply(quiz_json(1));
        let secondary = MockProvider::new("secondary").with_reply(quiz_json(3));
        let primary_calls = primary.call_count_handle();
        let secondary_calls = secondary.call_count_handle();
        let chain = ProviderChain::new(vec![
            Arc::new(primary) as Arc<dyn LlmProvider>,
            Arc::new(secondary) as Arc<dyn LlmProvider>,
        ]);

        let err = chain.generate_quiz("body", 3).await.unwrap_err();

        assert!(matches!(err, GenerationError::Shape { .. }));
        assert_eq!(*primary_calls.lock().unwrap(), 2);
        assert_eq!(*secondary_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrective_retry_recovers() {
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply("not json at all".to_string()),
            MockOutcome::Reply(quiz_json(2)),
        ]);
        let chain = single(provider);

        let questions = chain.generate_quiz("body", 2).await.unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn test_chain_exhaustion_surfaces_as_task_error() {
        let chain = single(MockProvider::new("p").with_outcome(MockOutcome::Timeout));
        let err = chain.generate_curriculum("physics", 3).await.unwrap_err();
        match err {
            GenerationError::Chain { task, .. } => assert_eq!(task, "curriculum"),
            other => panic!("expected Chain error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_synthesize_lesson_validates_objectives() {
        let bad = r#"{"title":"T","content":"C","objectives":[]}"#;
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(bad.to_string()),
            MockOutcome::Reply(
                r#"{"title":"T","content":"C","objectives":["learn a thing"]}"#.to_string(),
            ),
        ]);
        let chain = single(provider);

        let draft = chain.synthesize_lesson(&[], "physics", 300).await.unwrap();
        assert_eq!(draft.objectives.len(), 1);
    }

    #[tokio::test]
    async fn test_flashcards_happy_path() {
        let reply = r#"{"cards":[{"front":"f","back":"b"},{"front":"f2","back":"b2"}]}"#;
        let chain = single(MockProvider::new("p").with_reply(reply));
        let cards = chain.generate_flashcards("body", 2).await.unwrap();
        assert_eq!(cards.len(), 2);
    }
}
