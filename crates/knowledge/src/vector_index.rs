//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval.

use crate::types::Chunk;
use ragchat_core::AppResult;

/// Trait for vector index backends.
///
/// Writes need `&mut self`, so an index is filled by a single owner and can
/// then be shared read-only.
pub trait VectorIndex: Send + Sync {
    /// Add a chunk with its embedding.
    ///
    /// Fails when the embedding dimension differs from the index's first embedding.
    fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) -> AppResult<()>;

    /// Search for the `k` most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending score, every score in
    /// `[min_score, 1]`.
    fn search(&self, query_embedding: &[f32], k: usize, min_score: f32)
        -> AppResult<Vec<(Chunk, f32)>>;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension, fixed by the first insert.
    fn dimensions(&self) -> Option<usize>;
}
