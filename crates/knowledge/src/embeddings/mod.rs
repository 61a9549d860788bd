//! Embedding providers.
//!
//! Chunks and queries are embedded by the same provider so that their vectors
//! are comparable.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
