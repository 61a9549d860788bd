//! Prompt system for ragchat.
//!
//! Turns a question and a retrieved context block into the user message sent
//! to the model:
//! - YAML prompt definitions (optional override of the built-in template)
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
