//! Retrieval sources: local chunk stores and web search behind one contract.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, ScoredChunk};
use crate::vector_index::VectorIndex;
use crate::web::WebSearchEngine;
use async_trait::async_trait;
use ragchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Anything that can turn a query into ranked chunks.
#[async_trait]
pub trait RetrievalSource: Send + Sync {
    /// Source name, used for logging and as the chunks' origin.
    fn name(&self) -> &str;

    /// Retrieve chunks for a query, best first, scores in [0, 1].
    async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>>;
}

/// Semantic search over one ingested corpus.
pub struct LocalSource {
    name: String,
    store: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    max_results: usize,
    min_score: f32,
}

impl LocalSource {
    /// `embedder` must be the provider the store was filled with.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        max_results: usize,
        min_score: f32,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            embedder,
            max_results,
            min_score,
        }
    }
}

#[async_trait]
impl RetrievalSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        if self.store.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            AppError::Retrieval(format!("Failed to embed query for '{}': {}", self.name, e))
        })?;

        let results = self
            .store
            .search(&query_embedding, self.max_results, self.min_score)?;

        tracing::debug!(
            "Source '{}' matched {} chunks (top score: {:.3})",
            self.name,
            results.len(),
            results.first().map(|(_, s)| *s).unwrap_or(0.0)
        );

        Ok(results
            .into_iter()
            .map(|(chunk, score)| ScoredChunk {
                chunk,
                score,
                origin: self.name.clone(),
            })
            .collect())
    }
}

/// Live web search as a retrieval source.
pub struct WebSource {
    engine: Arc<dyn WebSearchEngine>,
    max_results: usize,
}

impl WebSource {
    pub fn new(engine: Arc<dyn WebSearchEngine>, max_results: usize) -> Self {
        Self {
            engine,
            max_results,
        }
    }
}

#[async_trait]
impl RetrievalSource for WebSource {
    fn name(&self) -> &str {
        self.engine.name()
    }

    async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        let mut hits = self.engine.search(query, self.max_results).await?;
        hits.truncate(self.max_results);

        let total = hits.len();
        let mut results: Vec<ScoredChunk> = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                // Without an engine score, rank decides: 1.0 for the first hit, then linearly down
                let score = hit
                    .score
                    .map(|s| s.clamp(0.0, 1.0))
                    .unwrap_or(1.0 - rank as f32 / total as f32);

                let text = if hit.title.trim().is_empty() {
                    hit.snippet
                } else {
                    format!("{}\n{}", hit.title, hit.snippet)
                };

                ScoredChunk {
                    chunk: Chunk {
                        id: format!("{}#{}", hit.url, rank),
                        source_id: hit.url,
                        position: rank as u32,
                        offset: 0,
                        text,
                    },
                    score,
                    origin: self.engine.name().to_string(),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }
}
