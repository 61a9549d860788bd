//! Retrieval augmentation: merged candidates to a bounded context block to a prompt.

use ragchat_core::AppResult;
use ragchat_knowledge::RetrievalResult;
use ragchat_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::collections::{HashMap, HashSet};

/// Separator between chunks in the context block.
const CHUNK_SEPARATOR: &str = "\n\n";

/// Builds the outgoing prompt from a question and retrieved chunks.
#[derive(Debug, Clone)]
pub struct RetrievalAugmentor {
    template: PromptDefinition,
    max_context_chars: usize,
}

impl RetrievalAugmentor {
    pub fn new(template: PromptDefinition, max_context_chars: usize) -> Self {
        Self {
            template,
            max_context_chars,
        }
    }

    /// Render the prompt for `question`.
    ///
    /// The context block comes before the question; the system role is
    /// carried separately. With no candidates only the question is rendered.
    pub fn augment(
        &self,
        question: &str,
        system_role: Option<&str>,
        merged: &RetrievalResult,
    ) -> AppResult<BuiltPrompt> {
        let context = self.context_block(merged);

        tracing::debug!(
            "Context block: {} chars from {} candidates",
            context.chars().count(),
            merged.len()
        );

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context);

        build_prompt(
            &self.template,
            variables,
            system_role.map(str::to_string),
        )
    }

    /// Join distinct chunk texts in rank order, truncated to `max_context_chars` characters.
    pub fn context_block(&self, merged: &RetrievalResult) -> String {
        let mut seen = HashSet::new();
        let texts: Vec<&str> = merged
            .candidates
            .iter()
            .map(|c| c.chunk.text.trim())
            .filter(|text| !text.is_empty() && seen.insert(*text))
            .collect();

        truncate_chars(&texts.join(CHUNK_SEPARATOR), self.max_context_chars)
    }
}

/// Truncate to at most `max_chars` characters, never splitting a character.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
