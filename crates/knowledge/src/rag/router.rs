//! Query routing across retrieval sources.

use crate::rag::sources::RetrievalSource;
use crate::types::{RetrievalResult, ScoredChunk};
use futures::future::join_all;
use ragchat_core::config::RetrievalSettings;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Fans a query out to every source and merges the ranked results.
///
/// Sources run concurrently, each under its own timeout. A source that fails
/// or times out is logged and left out; it never fails the query.
#[derive(Clone)]
pub struct QueryRouter {
    sources: Vec<Arc<dyn RetrievalSource>>,
    max_candidates: usize,
    source_timeout: Duration,
}

impl QueryRouter {
    pub fn new(max_candidates: usize, source_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            max_candidates,
            source_timeout,
        }
    }

    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self::new(
            settings.max_candidates,
            Duration::from_secs(settings.source_timeout_secs),
        )
    }

    /// Register a source. Merge ties are broken by registration order.
    pub fn with_source(mut self, source: Arc<dyn RetrievalSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Retrieve merged candidates for a query, sorted by descending score and
    /// capped at `max_candidates`. Empty when no source answers.
    pub async fn route(&self, query: &str) -> RetrievalResult {
        if self.sources.is_empty() {
            tracing::debug!("No retrieval sources registered");
            return RetrievalResult::empty();
        }

        let timeout = self.source_timeout;
        let calls = self.sources.iter().map(|source| async move {
            let outcome = tokio::time::timeout(timeout, source.retrieve(query)).await;
            (source.name(), outcome)
        });

        let mut merged: Vec<ScoredChunk> = Vec::new();

        for (name, outcome) in join_all(calls).await {
            match outcome {
                Ok(Ok(chunks)) => {
                    tracing::debug!("Source '{}' returned {} chunks", name, chunks.len());
                    merged.extend(chunks);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Source '{}' failed: {}", name, e);
                }
                Err(_) => {
                    tracing::warn!("Source '{}' timed out after {:?}", name, timeout);
                }
            }
        }

        // Stable: equal scores keep source registration order
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        merged.truncate(self.max_candidates);

        tracing::info!(
            "Routed query to {} sources: {} candidates",
            self.sources.len(),
            merged.len()
        );

        RetrievalResult::new(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use async_trait::async_trait;
    use ragchat_core::{AppError, AppResult};

    enum Behaviour {
        Scores(Vec<f32>),
        Fail,
        Hang,
    }

    struct StubSource {
        name: String,
        behaviour: Behaviour,
    }

    impl StubSource {
        fn arc(name: &str, behaviour: Behaviour) -> Arc<dyn RetrievalSource> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour,
            })
        }
    }

    #[async_trait]
    impl RetrievalSource for StubSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn retrieve(&self, _query: &str) -> AppResult<Vec<ScoredChunk>> {
            match &self.behaviour {
                Behaviour::Scores(scores) => Ok(scores
                    .iter()
                    .enumerate()
                    .map(|(i, score)| ScoredChunk {
                        chunk: Chunk {
                            id: format!("{}-{}", self.name, i),
                            source_id: self.name.clone(),
                            position: i as u32,
                            offset: 0,
                            text: format!("{} chunk {}", self.name, i),
                        },
                        score: *score,
                        origin: self.name.clone(),
                    })
                    .collect()),
                Behaviour::Fail => Err(AppError::Retrieval("backend down".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn router(cap: usize) -> QueryRouter {
        QueryRouter::new(cap, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_no_sources_is_empty() {
        assert!(router(9).route("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_merges_and_sorts_descending() {
        let router = router(9)
            .with_source(StubSource::arc("a", Behaviour::Scores(vec![0.9, 0.6])))
            .with_source(StubSource::arc("b", Behaviour::Scores(vec![0.8, 0.7])));

        let result = router.route("q").await;
        let scores: Vec<f32> = result.candidates.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![0.9, 0.8, 0.7, 0.6]);
    }

    #[tokio::test]
    async fn test_caps_candidates() {
        let router = router(3)
            .with_source(StubSource::arc("a", Behaviour::Scores(vec![0.9, 0.6, 0.5])))
            .with_source(StubSource::arc("b", Behaviour::Scores(vec![0.8, 0.7, 0.55])));

        let result = router.route("q").await;
        assert_eq!(result.len(), 3);
        assert_eq!(result.max_score(), 0.9);
    }

    #[tokio::test]
    async fn test_ties_keep_source_order() {
        let router = router(9)
            .with_source(StubSource::arc("first", Behaviour::Scores(vec![0.5])))
            .with_source(StubSource::arc("second", Behaviour::Scores(vec![0.5])));

        let result = router.route("q").await;
        assert_eq!(result.candidates[0].origin, "first");
        assert_eq!(result.candidates[1].origin, "second");
    }

    #[tokio::test]
    async fn test_failing_and_slow_sources_are_excluded() {
        let router = router(9)
            .with_source(StubSource::arc("broken", Behaviour::Fail))
            .with_source(StubSource::arc("slow", Behaviour::Hang))
            .with_source(StubSource::arc("ok", Behaviour::Scores(vec![0.7])));

        let result = router.route("q").await;
        assert_eq!(result.len(), 1);
        assert_eq!(result.candidates[0].origin, "ok");
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_empty() {
        let router = router(9)
            .with_source(StubSource::arc("broken", Behaviour::Fail))
            .with_source(StubSource::arc("slow", Behaviour::Hang));

        assert!(router.route("q").await.is_empty());
    }

    #[test]
    fn test_source_names() {
        let router = router(9)
            .with_source(StubSource::arc("guides", Behaviour::Fail))
            .with_source(StubSource::arc("tavily", Behaviour::Fail));
        assert_eq!(router.source_names(), vec!["guides", "tavily"]);
    }
}
