//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use ragchat_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// The template is rendered with the variables; `system` is passed through
/// untouched as the separate system message. The prompt counts as carrying
/// context when the `context` variable is present and non-blank.
///
/// # Example
/// ```no_run
/// use ragchat_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is Rust?".to_string());
///
/// let built = build_prompt(&PromptDefinition::default(), vars, None)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
    system: Option<String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let context_included = variables
        .get("context")
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system.filter(|s| !s.trim().is_empty()),
        user,
        definition.id.clone(),
        context_included,
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let handlebars = compile(template)?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Register a template under the name "prompt", with HTML escaping disabled.
pub(crate) fn compile(template: &str) -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    Ok(handlebars)
}
