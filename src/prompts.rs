//! Prompts for the LLM translation backend.
//!
//! Centralising prompts here keeps [`crate::translator::llm`] focused on the
//! call and reply handling, and lets unit tests inspect the exact wording
//! without a live model.

use crate::language::LanguagePair;

/// System prompt template. `{source}` and `{target}` are replaced with the
/// English language names.
pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You are a professional document translator. Translate from {source} to {target}.

You receive a JSON array of paragraphs taken in reading order from one document.

Rules:
1. Translate every paragraph independently and completely.
2. Keep numbers, names, URLs and code unchanged.
3. Do not merge, split, reorder, or skip paragraphs.
4. Reply with ONLY a JSON array of strings: one translated paragraph per input paragraph, in the same order.
5. Do NOT wrap the reply in ``` fences and do NOT add commentary."#;

/// Render the system prompt for `pair`.
pub fn system_prompt(pair: LanguagePair) -> String {
    TRANSLATION_SYSTEM_PROMPT
        .replace("{source}", pair.source.english_name())
        .replace("{target}", pair.target.english_name())
}

/// Render the user message carrying the batch.
pub fn batch_message(texts: &[String]) -> String {
    // Serialising a slice of strings cannot fail.
    serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string())
}
