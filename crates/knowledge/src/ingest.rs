//! Ingestion pipeline: parse, chunk, embed, store.

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::parser;
use crate::types::IngestStats;
use crate::vector_index::VectorIndex;
use ragchat_core::config::{EmbeddingSettings, RetrievalSettings};
use ragchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Turns source documents into embedded chunks in a [`VectorIndex`].
///
/// Ingestion appends: a source ingested twice is stored twice.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    chunk_size: usize,
    overlap: usize,
    batch_size: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IngestionPipeline {
    /// Create a pipeline. Fails when `overlap >= chunk_size` or `chunk_size == 0`.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        batch_size: usize,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        chunker::validate_params(chunk_size, overlap)?;

        Ok(Self {
            chunk_size,
            overlap,
            batch_size: batch_size.max(1),
            embedder,
        })
    }

    pub fn from_settings(
        retrieval: &RetrievalSettings,
        embedding: &EmbeddingSettings,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        Self::new(
            retrieval.chunk_size,
            retrieval.chunk_overlap,
            embedding.batch_size,
            embedder,
        )
    }

    /// The provider chunks are embedded with. Queries must use the same one.
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Ingest one file. Returns the number of chunks stored.
    ///
    /// Nothing is stored when any step fails.
    pub async fn ingest<S>(&self, source: &Path, store: &mut S) -> AppResult<usize>
    where
        S: VectorIndex + ?Sized,
    {
        tracing::debug!("Ingesting {:?}", source);

        let document = parser::parse_file(source)?;
        let chunks = chunker::chunk_text(
            &document.source_id,
            &document.text,
            self.chunk_size,
            self.overlap,
        )?;

        if chunks.is_empty() {
            tracing::warn!("No text extracted from {:?}", source);
            return Ok(0);
        }

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
                AppError::Ingestion(format!("Failed to embed {:?}: {}", source, e))
            })?;

            if vectors.len() != texts.len() {
                return Err(AppError::Ingestion(format!(
                    "Embedding provider returned {} vectors for {} chunks of {:?}",
                    vectors.len(),
                    texts.len(),
                    source
                )));
            }
            embeddings.extend(vectors);
        }

        let count = chunks.len();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            store.add(chunk, embedding)?;
        }

        tracing::debug!(
            "Ingested {:?} ({}): {} chunks, {} bytes",
            source,
            document.content_type,
            count,
            document.text.len()
        );

        Ok(count)
    }

    /// Ingest files and directories into one store.
    ///
    /// Directories are walked recursively. A failing source is logged and
    /// skipped; the others are still ingested.
    pub async fn ingest_corpus<S>(&self, sources: &[PathBuf], store: &mut S) -> IngestStats
    where
        S: VectorIndex + ?Sized,
    {
        let start = Instant::now();
        let mut stats = IngestStats::default();

        for path in expand_sources(sources) {
            match self.ingest(&path, store).await {
                Ok(count) => {
                    stats.sources_count += 1;
                    stats.chunks_count += count as u32;
                    stats.bytes_processed += std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    stats.failed_count += 1;
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            "Ingestion completed: {} sources, {} failed, {} chunks in {:.2}s",
            stats.sources_count,
            stats.failed_count,
            stats.chunks_count,
            stats.duration_secs
        );

        stats
    }
}

/// Expand directories into the files beneath them, skipping hidden entries.
/// Paths that are neither files nor directories are kept so ingestion reports them.
fn expand_sources(sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in sources {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::store::InMemoryChunkStore;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline() -> IngestionPipeline {
        IngestionPipeline::new(300, 30, 2, Arc::new(TrigramProvider::new(64))).unwrap()
    }

    #[test]
    fn test_invalid_chunk_params() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(64));
        assert!(matches!(
            IngestionPipeline::new(30, 30, 8, Arc::clone(&embedder)),
            Err(AppError::Ingestion(_))
        ));
        assert!(IngestionPipeline::new(0, 0, 8, embedder).is_err());
    }

    #[tokio::test]
    async fn test_ingest_nine_hundred_chars() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        fs::write(&path, "word ".repeat(180)).unwrap();

        let mut store = InMemoryChunkStore::new("docs");
        let count = pipeline().ingest(&path, &mut store).await.unwrap();

        assert_eq!(count, 4);
        assert_eq!(store.len(), 4);
        assert_eq!(store.dimensions(), Some(64));
    }

    #[tokio::test]
    async fn test_ingest_missing_file_stores_nothing() {
        let temp = TempDir::new().unwrap();
        let mut store = InMemoryChunkStore::new("docs");

        let result = pipeline()
            .ingest(&temp.path().join("missing.txt"), &mut store)
            .await;

        assert!(matches!(result, Err(AppError::Ingestion(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_appends_on_repeat() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("paris.txt");
        fs::write(&path, "Paris is the capital of France.").unwrap();

        let mut store = InMemoryChunkStore::new("docs");
        pipeline().ingest(&path, &mut store).await.unwrap();
        pipeline().ingest(&path, &mut store).await.unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_corpus_skips_failures() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("guides");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::create_dir_all(dir.join(".cache")).unwrap();
        fs::write(dir.join("paris.md"), "# Paris\nParis is the capital of France.").unwrap();
        fs::write(dir.join("nested/lyon.txt"), "Lyon is known for its cuisine.").unwrap();
        fs::write(dir.join(".cache/ignored.txt"), "should not be read").unwrap();
        fs::write(dir.join("blob.bin"), b"\0\0\0").unwrap();

        let sources = vec![dir, temp.path().join("missing.txt")];
        let mut store = InMemoryChunkStore::new("guides");
        let stats = pipeline().ingest_corpus(&sources, &mut store).await;

        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.failed_count, 2);
        assert_eq!(stats.chunks_count, 2);
        assert_eq!(store.len(), 2);
        assert!(store.chunks().all(|c| !c.text.contains("should not be read")));
    }

    #[tokio::test]
    async fn test_empty_file_yields_no_chunks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.txt");
        fs::write(&path, "   \n").unwrap();

        let mut store = InMemoryChunkStore::new("docs");
        assert_eq!(pipeline().ingest(&path, &mut store).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
