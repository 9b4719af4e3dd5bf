//! Prompt builders for the typed generation tasks.
//!
//! Each task requests a strict JSON object so the response can be parsed
//! and shape-validated without heuristics.

use crate::types::content::NormalizedContent;

/// System prompt shared by all generation tasks.
pub const SYSTEM_PROMPT: &str = "You are an educational content generator. \
Respond with a single JSON object exactly matching the requested schema. \
No prose outside the JSON.";

/// Prompt for planning a curriculum of lessons in a field.
pub fn format_curriculum_prompt(field: &str, num_lessons: usize) -> String {
    format!(
        "Plan a curriculum for the field \"{field}\".\n\
         Produce exactly {num_lessons} lessons ordered from introductory to advanced.\n\n\
         Respond with JSON:\n\
         {{\"lessons\": [{{\"title\": \"...\", \"topic\": \"...\", \"summary\": \"...\"}}]}}"
    )
}

/// Prompt for synthesizing a lesson body from source material.
pub fn format_lesson_prompt(contents: &[NormalizedContent], field: &str, max_words: usize) -> String {
    let mut sources = String::new();
    for (i, item) in contents.iter().enumerate() {
        // Cap per-source excerpt so a long paper doesn't crowd out the rest.
        let excerpt: String = item.content.chars().take(2000).collect();
        sources.push_str(&format!(
            "--- Source {} ({}) ---\nTitle: {}\n{}\n\n",
            i + 1,
            item.source,
            item.title,
            excerpt
        ));
    }

    format!(
        "Write a lesson for students of {field}, synthesized from the sources below.\n\
         Maximum {max_words} words of body text. Cite no URLs in the body.\n\n\
         {sources}\
         Respond with JSON:\n\
         {{\"title\": \"...\", \"content\": \"markdown body\", \"objectives\": [\"...\"]}}"
    )
}

/// Prompt for generating a quiz from lesson content.
pub fn format_quiz_prompt(content: &str, num_questions: usize) -> String {
    format!(
        "Write exactly {num_questions} multiple-choice questions testing the lesson below.\n\
         Each question has 4 options and one correct answer.\n\n\
         Lesson:\n{content}\n\n\
         Respond with JSON:\n\
         {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\"], \
         \"answer_index\": 0, \"explanation\": \"...\"}}]}}"
    )
}

/// Prompt for generating flashcards from lesson content.
pub fn format_flashcard_prompt(content: &str, num_cards: usize) -> String {
    format!(
        "Write exactly {num_cards} flashcards for the lesson below.\n\
         Fronts are terms or questions, backs are concise answers.\n\n\
         Lesson:\n{content}\n\n\
         Respond with JSON:\n\
         {{\"cards\": [{{\"front\": \"...\", \"back\": \"...\"}}]}}"
    )
}

/// Prompt asking the model to re-rank candidate sources for a topic.
pub fn format_refine_prompt(topic: &str, catalog_summary: &str, candidates: &[String], max_apis: usize) -> String {
    format!(
        "Pick the best sources for researching the topic \"{topic}\".\n\
         Known source catalog:\n{catalog_summary}\n\
         Candidates (choose only from these): {}\n\
         Return at most {max_apis} ids, best first.\n\n\
         Respond with JSON:\n\
         {{\"sources\": [\"id\"]}}",
        candidates.join(", ")
    )
}

/// Corrective follow-up used for the single local retry after a shape
/// validation failure.
pub fn format_corrective_prompt(reason: &str) -> String {
    format!(
        "Your previous response was structurally invalid: {reason}. \
         Respond again with ONLY the JSON object in the requested schema."
    )
}
