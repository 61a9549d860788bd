//! Knowledge retrieval for ragchat.
//!
//! Documents are parsed, chunked and embedded into in-memory chunk stores at
//! startup. Queries are answered by retrieval sources (local stores, web
//! search) whose ranked results the query router merges.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod parser;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;
pub mod web;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use ingest::IngestionPipeline;
pub use rag::{LocalSource, QueryRouter, RetrievalSource, WebSource};
pub use store::InMemoryChunkStore;
pub use types::{Chunk, Document, IngestStats, RetrievalResult, ScoredChunk};
pub use vector_index::VectorIndex;
pub use web::{TavilySearchEngine, WebSearchEngine, WebSearchHit};
