//! Prompt types for ragchat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of the built-in augmentation prompt.
pub const DEFAULT_AUGMENT_PROMPT_ID: &str = "rag.augment.default";

/// Built-in augmentation template: retrieved context first, then the question.
/// Without context only the question is rendered.
pub const DEFAULT_AUGMENT_TEMPLATE: &str = "{{#if context}}Answer using the following information:\n{{context}}\n\nQuestion:\n{{/if}}{{question}}";

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Template string with Handlebars syntax.
    /// Variables: `question`, `context`.
    pub template: String,
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: DEFAULT_AUGMENT_PROMPT_ID.to_string(),
            title: "Retrieval-augmented question".to_string(),
            api_version: "1.0".to_string(),
            template: DEFAULT_AUGMENT_TEMPLATE.to_string(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether a non-empty context block was injected
    #[serde(rename = "contextIncluded")]
    pub context_included: bool,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        context_included: bool,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                context_included,
                resolved_variables,
            },
        }
    }
}
