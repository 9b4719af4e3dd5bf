//! Lesson generation pipeline.
//!
//! Composes the orchestrator, provider chain, media collaborators, and
//! persistence into one flow. Only lesson synthesis and quiz generation
//! are fatal; flashcards and media degrade the result instead of
//! aborting it.

use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::llm::chain::ProviderChain;
use crate::orchestrator::ContentOrchestrator;
use crate::traits::media::MediaGenerator;
use crate::traits::store::LessonStore;
use crate::types::config::FetchOptions;
use crate::types::content::NormalizedContent;
use crate::types::lesson::{GenerationRequest, LessonRecord};

/// Drives source acquisition and generation into persisted lessons.
pub struct GenerationPipeline {
    orchestrator: Arc<ContentOrchestrator>,
    chain: Arc<ProviderChain>,
    store: Arc<dyn LessonStore>,
    image: Option<Arc<dyn MediaGenerator>>,
    audio: Option<Arc<dyn MediaGenerator>>,
    cancel: CancellationToken,
}

impl GenerationPipeline {
    /// Create a pipeline without media collaborators.
    pub fn new(
        orchestrator: Arc<ContentOrchestrator>,
        chain: Arc<ProviderChain>,
        store: Arc<dyn LessonStore>,
    ) -> Self {
        Self {
            orchestrator,
            chain,
            store,
            image: None,
            audio: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an image collaborator.
    pub fn with_image(mut self, generator: Arc<dyn MediaGenerator>) -> Self {
        self.image = Some(generator);
        self
    }

    /// Attach an audio collaborator.
    pub fn with_audio(mut self, generator: Arc<dyn MediaGenerator>) -> Self {
        self.audio = Some(generator);
        self
    }

    /// Use a caller-supplied cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Race a stage against cancellation. Dropping the stage future
    /// abandons its in-flight network call and releases the connection.
    async fn cancellable<T>(&self, stage: impl std::future::Future<Output = T>) -> Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            out = stage => Ok(out),
        }
    }

    /// Generate and persist one lesson from already-fetched sources.
    ///
    /// Synthesis failure (after the provider chain is exhausted) is the
    /// only fatal generation outcome besides the quiz falling below the
    /// requested minimum; flashcards and media are best-effort.
    pub async fn generate_lesson_from_sources(
        &self,
        request: &GenerationRequest,
        sources: &[NormalizedContent],
    ) -> Result<LessonRecord> {
        if sources.is_empty() {
            return Err(PipelineError::NoContentAvailable {
                topic: request.topic.clone(),
            });
        }
        self.check_cancelled()?;

        // Required: lesson synthesis.
        let draft = self
            .cancellable(self.chain.synthesize_lesson(
                sources,
                &request.field,
                request.max_words,
            ))
            .await??;

        // Required: quiz meeting the requested minimum.
        let quiz = self
            .cancellable(
                self.chain
                    .generate_quiz(&draft.content, request.num_quiz_questions),
            )
            .await??;

        // Optional: flashcards.
        let flashcards = match self
            .cancellable(
                self.chain
                    .generate_flashcards(&draft.content, request.num_flashcards),
            )
            .await?
        {
            Ok(cards) => cards,
            Err(err) => {
                warn!(topic = %request.topic, error = %err, "flashcards failed, degrading");
                Vec::new()
            }
        };

        // Optional: media, generated concurrently.
        let image_prompt = format!("Educational illustration for a lesson titled \"{}\"", draft.title);
        let (image_url, audio_url) = self
            .cancellable(async {
                tokio::join!(
                    Self::try_media(self.image.as_deref(), &image_prompt),
                    Self::try_media(self.audio.as_deref(), &draft.content),
                )
            })
            .await?;

        let mut provenance: Vec<String> = Vec::new();
        for item in sources {
            let id = item.source.id().to_string();
            if !provenance.contains(&id) {
                provenance.push(id);
            }
        }

        let record = LessonRecord {
            id: Uuid::new_v4(),
            field_id: request.field.clone(),
            topic: request.topic.clone(),
            title: draft.title,
            content: draft.content,
            objectives: draft.objectives,
            quiz,
            flashcards,
            image_url,
            audio_url,
            provenance,
            created_at: chrono::Utc::now(),
        };

        // Never persist a record below the required-field bar.
        if !record.meets_minimum(request.num_quiz_questions) {
            return Err(PipelineError::Generation(
                crate::error::GenerationError::Shape {
                    task: "lesson".to_string(),
                    reason: "assembled record missing required fields".to_string(),
                },
            ));
        }

        let mut stored = self.store.upsert_lessons(std::slice::from_ref(&record)).await?;
        let stored = stored.pop().unwrap_or(record);

        info!(
            topic = %request.topic,
            degraded = stored.is_degraded(),
            quiz = stored.quiz.len(),
            "lesson generated"
        );
        Ok(stored)
    }

    /// Fetch sources for the request's topic, then generate a lesson.
    pub async fn generate_lesson(
        &self,
        request: &GenerationRequest,
        fetch_opts: &FetchOptions,
    ) -> Result<LessonRecord> {
        let sources = self
            .cancellable(self.orchestrator.fetch_multi_source(
                &request.field,
                &request.topic,
                fetch_opts,
            ))
            .await??;
        self.generate_lesson_from_sources(request, &sources).await
    }

    /// Plan a curriculum for a field and generate each planned lesson.
    ///
    /// Curriculum failure is fatal; individual lesson failures are
    /// logged and skipped so one bad topic cannot sink the batch.
    pub async fn generate_lessons_for_field(
        &self,
        field: &str,
        num_lessons: usize,
        fetch_opts: &FetchOptions,
    ) -> Result<Vec<LessonRecord>> {
        let plan = self
            .cancellable(self.chain.generate_curriculum(field, num_lessons))
            .await??;

        let mut records = Vec::with_capacity(plan.len());
        for entry in plan {
            self.check_cancelled()?;
            let request = GenerationRequest::new(field, &entry.topic);
            match self.generate_lesson(&request, fetch_opts).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(field, topic = %entry.topic, error = %err, "lesson skipped");
                }
            }
        }
        Ok(records)
    }

    async fn try_media(generator: Option<&dyn MediaGenerator>, prompt: &str) -> Option<String> {
        let generator = generator?;
        let result = generator.generate(prompt, &HashMap::new()).await;
        if result.success {
            result.url
        } else {
            warn!(
                kind = %generator.kind(),
                provider = %result.provider,
                error = result.error.as_deref().unwrap_or("unknown"),
                "media generation failed, leaving field empty"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ApiRegistry;
    use crate::selector::SourceSelector;
    use crate::stores::MemoryLessonStore;
    use crate::testing::{MockAdapter, MockMedia, MockOutcome, MockProvider};
    use crate::traits::media::MediaKind;
    use crate::traits::provider::LlmProvider;
    use crate::types::content::{ContentSource, SourceType};

    fn sources() -> Vec<NormalizedContent> {
        vec![NormalizedContent::new(
            ContentSource::Wikipedia,
            SourceType::Article,
            "Entropy",
            "Entropy measures disorder in a system.",
        )
        .unwrap()]
    }

    fn lesson_reply() -> String {
        r#"{"title":"Entropy","content":"Entropy measures disorder.","objectives":["Define entropy"]}"#
            .to_string()
    }

    fn quiz_reply(n: usize) -> String {
        let questions: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"question":"Q{i}?","options":["a","b"],"answer_index":0}}"#))
            .collect();
        format!(r#"{{"questions":[{}]}}"#, questions.join(","))
    }

    fn cards_reply() -> String {
        r#"{"cards":[{"front":"Entropy","back":"Disorder measure"}]}"#.to_string()
    }

    fn pipeline_with(provider: MockProvider) -> (GenerationPipeline, Arc<MemoryLessonStore>) {
        let registry = Arc::new(ApiRegistry::builtin());
        let selector = SourceSelector::new(Arc::clone(&registry));
        let orchestrator = Arc::new(
            ContentOrchestrator::new(registry, selector)
                .with_adapter(Arc::new(MockAdapter::new("wikipedia").with_items(2))),
        );
        let chain = Arc::new(ProviderChain::new(vec![
            Arc::new(provider) as Arc<dyn LlmProvider>
        ]));
        let store = Arc::new(MemoryLessonStore::new());
        let pipeline = GenerationPipeline::new(orchestrator, chain, Arc::clone(&store) as Arc<dyn LessonStore>);
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_full_generation_persists_record() {
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(lesson_reply()),
            MockOutcome::Reply(quiz_reply(5)),
            MockOutcome::Reply(cards_reply()),
        ]);
        let (pipeline, store) = pipeline_with(provider);
        let request = GenerationRequest::new("physics", "entropy");

        let record = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap();

        assert_eq!(record.quiz.len(), 5);
        assert_eq!(record.flashcards.len(), 1);
        assert_eq!(record.provenance, vec!["wikipedia".to_string()]);
        assert_eq!(store.lesson_count(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_fatal_and_nothing_persisted() {
        let provider = MockProvider::new("p").with_outcome(MockOutcome::Timeout);
        let (pipeline, store) = pipeline_with(provider);
        let request = GenerationRequest::new("physics", "entropy");

        let err = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Generation(_)));
        assert_eq!(store.lesson_count(), 0);
    }

    #[tokio::test]
    async fn test_flashcard_failure_degrades() {
        // Lesson and quiz succeed; every later call (flashcards plus its
        // corrective retry) returns garbage.
        let provider = MockProvider::new("p")
            .with_reply("not json")
            .with_script(vec![
                MockOutcome::Reply(lesson_reply()),
                MockOutcome::Reply(quiz_reply(5)),
            ]);
        let (pipeline, store) = pipeline_with(provider);
        let request = GenerationRequest::new("physics", "entropy");

        let record = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap();

        assert!(record.flashcards.is_empty());
        assert!(record.is_degraded());
        assert_eq!(store.lesson_count(), 1);
    }

    #[tokio::test]
    async fn test_media_failure_leaves_fields_null() {
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(lesson_reply()),
            MockOutcome::Reply(quiz_reply(5)),
            MockOutcome::Reply(cards_reply()),
        ]);
        let (pipeline, _store) = pipeline_with(provider);
        let pipeline = pipeline
            .with_image(Arc::new(MockMedia::failing(MediaKind::Image)))
            .with_audio(Arc::new(MockMedia::failing(MediaKind::Audio)));
        let request = GenerationRequest::new("physics", "entropy");

        let record = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap();

        assert!(record.image_url.is_none());
        assert!(record.audio_url.is_none());
    }

    #[tokio::test]
    async fn test_media_success_fills_fields() {
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(lesson_reply()),
            MockOutcome::Reply(quiz_reply(5)),
            MockOutcome::Reply(cards_reply()),
        ]);
        let (pipeline, _store) = pipeline_with(provider);
        let pipeline = pipeline
            .with_image(Arc::new(MockMedia::succeeding(MediaKind::Image)))
            .with_audio(Arc::new(MockMedia::succeeding(MediaKind::Audio)));
        let request = GenerationRequest::new("physics", "entropy");

        let record = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap();

        assert!(record.image_url.is_some());
        assert!(record.audio_url.is_some());
        assert!(!record.is_degraded() || record.flashcards.is_empty());
    }

    #[tokio::test]
    async fn test_empty_sources_rejected() {
        let provider = MockProvider::new("p").with_reply(lesson_reply());
        let (pipeline, _store) = pipeline_with(provider);
        let request = GenerationRequest::new("physics", "entropy");

        let err = pipeline
            .generate_lesson_from_sources(&request, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoContentAvailable { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_abandons_inflight_provider_call() {
        use crate::error::ProviderResult;
        use crate::traits::provider::{ChatMessage, Completion, CompletionParams};
        use std::time::{Duration, Instant};

        /// Provider whose completion never returns within the test.
        struct SlowProvider;

        #[async_trait::async_trait]
        impl LlmProvider for SlowProvider {
            fn id(&self) -> &str {
                "slow"
            }

            async fn complete(
                &self,
                _messages: &[ChatMessage],
                _params: &CompletionParams,
            ) -> ProviderResult<Completion> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Completion {
                    content: String::new(),
                    provider_id: "slow".to_string(),
                    model: "slow".to_string(),
                    latency: Duration::from_secs(60),
                })
            }
        }

        let registry = Arc::new(ApiRegistry::builtin());
        let selector = SourceSelector::new(Arc::clone(&registry));
        let orchestrator = Arc::new(ContentOrchestrator::new(registry, selector));
        let chain = Arc::new(ProviderChain::new(vec![
            Arc::new(SlowProvider) as Arc<dyn LlmProvider>
        ]));
        let store = Arc::new(MemoryLessonStore::new());
        let token = CancellationToken::new();
        let pipeline = GenerationPipeline::new(
            orchestrator,
            chain,
            Arc::clone(&store) as Arc<dyn LessonStore>,
        )
        .with_cancellation(token.clone());

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let request = GenerationRequest::new("physics", "entropy");
        let start = Instant::now();
        let err = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        // The in-flight synthesis call is dropped, not waited out.
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "cancellation waited for the provider: {:?}",
            start.elapsed()
        );
        assert_eq!(store.lesson_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_before_generation() {
        let provider = MockProvider::new("p").with_reply(lesson_reply());
        let (pipeline, store) = pipeline_with(provider);
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = pipeline.with_cancellation(token);
        let request = GenerationRequest::new("physics", "entropy");

        let err = pipeline
            .generate_lesson_from_sources(&request, &sources())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert_eq!(store.lesson_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_lessons_for_field() {
        let curriculum =
            r#"{"lessons":[{"title":"L1","topic":"entropy"},{"title":"L2","topic":"heat"}]}"#;
        let provider = MockProvider::new("p").with_script(vec![
            MockOutcome::Reply(curriculum.to_string()),
            // Lesson 1
            MockOutcome::Reply(lesson_reply()),
            MockOutcome::Reply(quiz_reply(5)),
            MockOutcome::Reply(cards_reply()),
            // Lesson 2
            MockOutcome::Reply(lesson_reply()),
            MockOutcome::Reply(quiz_reply(5)),
            MockOutcome::Reply(cards_reply()),
        ]);
        let (pipeline, store) = pipeline_with(provider);
        // "physics" selects arxiv first, but only wikipedia is registered;
        // one source is enough for each lesson.
        let fetch_opts = FetchOptions::new().with_num_sources(2).with_items_per_source(2);

        let records = pipeline
            .generate_lessons_for_field("physics", 2, &fetch_opts)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(store.lesson_count(), 2);
    }
}
