//! Web search engines used as a retrieval source.

pub mod tavily;

pub use tavily::TavilySearchEngine;

use async_trait::async_trait;
use ragchat_core::AppResult;
use serde::{Deserialize, Serialize};

/// A single hit returned by a web search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchHit {
    pub title: String,
    pub url: String,
    /// Snippet or extracted content
    pub snippet: String,
    /// Engine-reported relevance, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Trait for web search engines.
#[async_trait]
pub trait WebSearchEngine: Send + Sync {
    /// Run a search and return at most `num_results` hits, best first.
    async fn search(&self, query: &str, num_results: usize) -> AppResult<Vec<WebSearchHit>>;

    /// Engine name for logging
    fn name(&self) -> &'static str;
}
