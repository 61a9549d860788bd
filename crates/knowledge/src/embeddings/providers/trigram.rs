//! Offline embeddings built from hashed words and their character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use ragchat_core::AppResult;
use std::collections::BTreeMap;

/// Words too common to discriminate between chunks.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "who", "how", "where", "when", "does", "did",
];

const TRIGRAM_HASH_BASE: u64 = 37;
const WORD_HASH_BASE: u64 = 31;

/// Deterministic, dependency-free embeddings for offline use.
///
/// Each distinct word lands in one bucket weighted by its count, and each of
/// its character trigrams in another weighted by the square root of the
/// count. Texts sharing vocabulary end up close; there is no semantics
/// beyond that.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for (word, count) in word_counts(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let bucket = self.bucket(rolling_hash(trigram.as_bytes(), TRIGRAM_HASH_BASE));
                vector[bucket] += (count as f32).sqrt();
            }

            let bucket = self.bucket(rolling_hash(word.as_bytes(), WORD_HASH_BASE));
            vector[bucket] += count as f32;
        }

        normalize(&mut vector);
        vector
    }

    fn bucket(&self, hash: u64) -> usize {
        (hash as usize) % self.dimensions
    }
}

/// Counts of embeddable words: lowercase alphanumeric runs longer than two
/// characters, stop words excluded. Ordered so float sums are reproducible.
fn word_counts(text: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() > 2 && !STOP_WORDS.contains(&word) {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn rolling_hash(bytes: &[u8], base: u64) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_mul(base).wrapping_add(u64::from(b)))
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f32 {
        vector.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_provider_identity() {
        let provider = TrigramProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_batch_vectors_are_unit_length() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "Paris is the capital of France.".to_string(),
            "Madrid is the capital of Spain.".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            assert!((norm(embedding) - 1.0).abs() < 0.001);
        }
        assert_ne!(embeddings[0], embeddings[1]);
    }

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let provider = TrigramProvider::new(384);
        let text = "Rome Rome Rome is the capital of Italy, Rome.";
        assert_eq!(provider.embed(text).await.unwrap(), provider.embed(text).await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_words_only_gives_zero_vector() {
        let provider = TrigramProvider::new(64);
        for text in ["", "the of and", "it is at"] {
            let embedding = provider.embed(text).await.unwrap();
            assert!(embedding.iter().all(|&x| x == 0.0), "{:?}", text);
        }
    }

    #[test]
    fn test_word_counts() {
        let counts = word_counts("The Seine, the SEINE and Paris!");
        assert_eq!(counts.get("seine"), Some(&2));
        assert_eq!(counts.get("paris"), Some(&1));
        assert!(!counts.contains_key("the"));
        assert!(!counts.contains_key("and"));
    }

    #[tokio::test]
    async fn test_ranks_related_text_higher() {
        let provider = TrigramProvider::new(384);

        let query = provider.embed("What is the capital of France?").await.unwrap();
        let related = provider.embed("Paris is the capital of France.").await.unwrap();
        let unrelated = provider.embed("Cooking recipes for fresh pasta.").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_ignores_case_and_punctuation() {
        let provider = TrigramProvider::new(384);
        assert_eq!(
            provider.embed("capital france").await.unwrap(),
            provider.embed("Capital, France!").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_multibyte_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider
            .embed("La tour Eiffel est à Paris 🗼, au bord de la Seine.")
            .await
            .unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
