//! Language model gateway for ragchat.
//!
//! A provider-agnostic `LlmClient` trait with one capability: turn a prompt,
//! an optional system message and prior messages into generated text.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default, API key required)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use ragchat_llm::{create_client, LlmClient, LlmRequest};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
