//! In-memory chunk store with brute-force cosine search.

use crate::types::Chunk;
use crate::vector_index::VectorIndex;
use ragchat_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Chunks and embeddings of one corpus, held in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryChunkStore {
    name: String,
    entries: Vec<(Chunk, Vec<f32>)>,
    dimensions: Option<usize>,
}

impl InMemoryChunkStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            dimensions: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over stored chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|(chunk, _)| chunk)
    }
}

impl VectorIndex for InMemoryChunkStore {
    fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) -> AppResult<()> {
        if embedding.is_empty() {
            return Err(AppError::Ingestion(format!(
                "Empty embedding for chunk {} of {}",
                chunk.position, chunk.source_id
            )));
        }

        match self.dimensions {
            Some(dim) if dim != embedding.len() => {
                return Err(AppError::Ingestion(format!(
                    "Embedding dimension {} does not match store '{}' dimension {}",
                    embedding.len(),
                    self.name,
                    dim
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }

        self.entries.push((chunk, embedding));
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> AppResult<Vec<(Chunk, f32)>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dim) = self.dimensions {
            if dim != query_embedding.len() {
                return Err(AppError::Retrieval(format!(
                    "Query dimension {} does not match store '{}' dimension {}",
                    query_embedding.len(),
                    self.name,
                    dim
                )));
            }
        }

        let mut scored: Vec<(&Chunk, f32)> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| (chunk, relevance(query_embedding, embedding)))
            .collect();

        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        let results: Vec<(Chunk, f32)> = scored
            .into_iter()
            .filter(|(_, score)| *score >= min_score)
            .map(|(chunk, score)| (chunk.clone(), score))
            .collect();

        tracing::debug!(
            "Store '{}': {} of {} chunks above {:.2}",
            self.name,
            results.len(),
            self.entries.len(),
            min_score
        );

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

/// Relevance score in [0, 1]: cosine similarity mapped linearly, so
/// orthogonal vectors score 0.5 and opposed vectors 0.0.
pub fn relevance(a: &[f32], b: &[f32]) -> f32 {
    ((cosine_similarity(a, b) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
