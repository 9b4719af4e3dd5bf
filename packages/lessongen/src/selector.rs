//! Source selection policy.
//!
//! Maps a field of study to a ranked set of catalog categories, then
//! intersects with the registry. An optional LLM refinement re-ranks the
//! candidates for the specific topic; any refinement failure falls back
//! to the static ranking. Selection never fails outright.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::chain::ProviderChain;
use crate::llm::prompts;
use crate::registry::{ApiRegistry, Category};
use crate::traits::provider::{ChatMessage, CompletionParams};

/// Ranked categories for a field of study. First category ranks highest.
fn categories_for_field(field: &str) -> &'static [Category] {
    match field {
        "computer-science" | "programming" => &[
            Category::Community,
            Category::Research,
            Category::Encyclopedia,
            Category::Qa,
        ],
        "mathematics" | "physics" | "biology" | "chemistry" => &[
            Category::Research,
            Category::Encyclopedia,
            Category::Qa,
        ],
        "history" | "philosophy" | "literature" => &[
            Category::Encyclopedia,
            Category::Books,
            Category::Qa,
        ],
        "economics" | "finance" => &[
            Category::News,
            Category::Encyclopedia,
            Category::Research,
        ],
        _ => &[
            Category::Encyclopedia,
            Category::Research,
            Category::Community,
        ],
    }
}

#[derive(Deserialize)]
struct RefineResponse {
    sources: Vec<String>,
}

/// Picks which source APIs to query for a topic.
pub struct SourceSelector {
    registry: Arc<ApiRegistry>,
    /// When set, the chain re-ranks candidates per topic.
    refinement: Option<Arc<ProviderChain>>,
}

impl SourceSelector {
    /// Create a selector with static ranking only.
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self {
            registry,
            refinement: None,
        }
    }

    /// Enable LLM-assisted refinement through a provider chain.
    pub fn with_refinement(mut self, chain: Arc<ProviderChain>) -> Self {
        self.refinement = Some(chain);
        self
    }

    /// Candidate ids for a field: category rank order, then registry
    /// declaration order within a category, duplicates removed.
    pub fn candidates(&self, field: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for category in categories_for_field(field) {
            for id in self.registry.get_by_category(*category) {
                if !out.iter().any(|existing| existing == id) {
                    out.push(id.to_string());
                }
            }
        }
        out
    }

    /// Select up to `max_apis` source ids for a topic.
    ///
    /// Returns `min(max_apis, candidates)` ids; empty only when the
    /// registry has no candidate for the field's categories at all.
    pub async fn select(&self, topic: &str, field: &str, max_apis: usize) -> Vec<String> {
        let candidates = self.candidates(field);
        if candidates.is_empty() || max_apis == 0 {
            return Vec::new();
        }

        if let Some(chain) = &self.refinement {
            match self.refine(chain, topic, &candidates, max_apis).await {
                Some(refined) if !refined.is_empty() => {
                    debug!(topic, field, selected = ?refined, "LLM-refined selection");
                    return refined;
                }
                _ => {
                    warn!(topic, field, "selection refinement failed, using static ranking");
                }
            }
        }

        candidates.into_iter().take(max_apis).collect()
    }

    /// Ask the chain to re-rank candidates. Unknown ids in the reply are
    /// discarded; `None` on any provider or parse failure.
    async fn refine(
        &self,
        chain: &ProviderChain,
        topic: &str,
        candidates: &[String],
        max_apis: usize,
    ) -> Option<Vec<String>> {
        let prompt = prompts::format_refine_prompt(
            topic,
            &self.registry.summary(),
            candidates,
            max_apis,
        );
        let messages = [
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let params = CompletionParams::new().with_temperature(0.0).json();

        let completion = chain.complete(&messages, &params).await.ok()?;
        let parsed: RefineResponse =
            crate::llm::tasks::parse_json_reply(&completion.content).ok()?;

        let mut refined: Vec<String> = Vec::new();
        for id in parsed.sources {
            if candidates.contains(&id) && !refined.contains(&id) {
                refined.push(id);
            }
        }
        refined.truncate(max_apis);
        Some(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOutcome, MockProvider};
    use crate::traits::provider::LlmProvider;

    fn selector() -> SourceSelector {
        SourceSelector::new(Arc::new(ApiRegistry::builtin()))
    }

    fn chain_of(provider: MockProvider) -> Arc<ProviderChain> {
        Arc::new(ProviderChain::new(vec![
            Arc::new(provider) as Arc<dyn LlmProvider>
        ]))
    }

    #[tokio::test]
    async fn test_static_ranking_for_science_fields() {
        let picked = selector().select("entropy", "physics", 2).await;
        // Research ranks first for physics, then encyclopedia.
        assert_eq!(picked, vec!["arxiv".to_string(), "wikipedia".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_field_uses_default_ranking() {
        let picked = selector().select("anything", "underwater-basketry", 3).await;
        assert_eq!(picked[0], "wikipedia");
        assert_eq!(picked.len(), 3);
    }

    #[tokio::test]
    async fn test_never_more_than_max_apis() {
        let picked = selector().select("entropy", "physics", 1).await;
        assert_eq!(picked.len(), 1);
    }

    #[tokio::test]
    async fn test_refinement_reorders_candidates() {
        let provider =
            MockProvider::new("p").with_reply(r#"{"sources":["wikipedia","arxiv"]}"#);
        let selector = selector().with_refinement(chain_of(provider));

        let picked = selector.select("entropy", "physics", 2).await;
        assert_eq!(picked, vec!["wikipedia".to_string(), "arxiv".to_string()]);
    }

    #[tokio::test]
    async fn test_refinement_discards_unknown_ids() {
        let provider = MockProvider::new("p")
            .with_reply(r#"{"sources":["made-up-source","arxiv"]}"#);
        let selector = selector().with_refinement(chain_of(provider));

        let picked = selector.select("entropy", "physics", 2).await;
        assert_eq!(picked, vec!["arxiv".to_string()]);
    }

    #[tokio::test]
    async fn test_refinement_failure_falls_back_to_static() {
        let provider = MockProvider::new("p").with_outcome(MockOutcome::Timeout);
        let selector = selector().with_refinement(chain_of(provider));

        let picked = selector.select("entropy", "physics", 2).await;
        // Deterministic static fallback, never zero when candidates exist.
        assert_eq!(picked, vec!["arxiv".to_string(), "wikipedia".to_string()]);
    }

    #[tokio::test]
    async fn test_refinement_garbage_reply_falls_back() {
        let provider = MockProvider::new("p").with_reply("certainly! here are sources");
        let selector = selector().with_refinement(chain_of(provider));

        let picked = selector.select("entropy", "physics", 2).await;
        assert_eq!(picked, vec!["arxiv".to_string(), "wikipedia".to_string()]);
    }
}
