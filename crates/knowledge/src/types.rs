//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A parsed source document, alive only until it has been chunked.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source identifier (the file path)
    pub source_id: String,

    /// Detected content type ("markdown", "pdf", ...)
    pub content_type: String,

    /// Extracted plain text
    pub text: String,
}

/// A text fragment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source document identifier (path or URL)
    pub source_id: String,

    /// Position within source
    pub position: u32,

    /// Character offset of the first character within the source text
    pub offset: usize,

    /// Text content
    pub text: String,
}

/// A chunk paired with its relevance to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Relevance in [0, 1]
    pub score: f32,

    /// Name of the retrieval source that produced the chunk
    pub origin: String,
}

/// Merged, ranked candidates for one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Candidates sorted by descending score
    pub candidates: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(candidates: Vec<ScoredChunk>) -> Self {
        Self { candidates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest score, or 0.0 when nothing was retrieved.
    pub fn max_score(&self) -> f32 {
        self.candidates.first().map(|c| c.score).unwrap_or(0.0)
    }
}

/// Statistics from ingesting a corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of sources ingested successfully
    pub sources_count: u32,

    /// Number of sources skipped because they failed
    pub failed_count: u32,

    /// Number of chunks stored
    pub chunks_count: u32,

    /// Total bytes of extracted text
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}
