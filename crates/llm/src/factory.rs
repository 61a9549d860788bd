//! LLM provider factory.
//!
//! Builds the model gateway from configuration. A provider that needs a
//! credential fails here, at startup, rather than on the first turn.

use crate::client::LlmClient;
use crate::providers::{gemini, ollama, GeminiClient, OllamaClient};
use crate::types::ProviderType;
use ragchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by Gemini
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let api_key = api_key.filter(|k| !k.trim().is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "{} provider requires API key",
            provider_type.as_str()
        )));
    }

    tracing::debug!("Creating {} client", provider_type.as_str());

    match provider_type {
        ProviderType::Gemini => {
            let base_url = endpoint.unwrap_or(gemini::DEFAULT_GEMINI_URL);
            Ok(Arc::new(GeminiClient::new(
                base_url,
                api_key.unwrap_or_default(),
                timeout,
            )?))
        }
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::new(base_url, timeout)?))
        }
    }
}
