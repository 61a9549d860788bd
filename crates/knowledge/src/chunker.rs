//! Text chunking with configurable size and overlap.

use crate::types::Chunk;
use ragchat_core::{AppError, AppResult};

/// Check chunking parameters.
pub fn validate_params(chunk_size: usize, overlap: usize) -> AppResult<()> {
    if chunk_size == 0 {
        return Err(AppError::Ingestion(
            "Chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(AppError::Ingestion(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

/// Chunk text into overlapping windows of `chunk_size` characters.
///
/// Windows advance by `chunk_size - overlap` characters and the last one may
/// be shorter. A text of `L` characters yields `ceil((L - overlap) / (chunk_size - overlap))`
/// chunks, exactly one when `L <= chunk_size`, none when the text is blank.
pub fn chunk_text(
    source_id: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    validate_params(chunk_size, overlap)?;

    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    // Work on chars so windows never split a UTF-8 sequence
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(chars.len());

        chunks.push(Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.to_string(),
            position,
            offset: start,
            text: chars[start..end].iter().collect(),
        });

        if end >= chars.len() {
            break;
        }

        position += 1;
        start += step;
    }

    tracing::debug!(
        "Chunked {} into {} chunks (size: {}, overlap: {})",
        source_id,
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_nine_hundred_chars_make_four_chunks() {
        let text = "a".repeat(900);
        let chunks = chunk_text("doc", &text, 300, 30).unwrap();

        assert_eq!(chunks.len(), 4);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 270, 540, 810]);
        assert_eq!(chunks[3].text.chars().count(), 90);
    }

    #[test]
    fn test_chunk_count_matches_formula() {
        for len in [1, 29, 30, 299, 300, 301, 570, 571, 1000, 2345] {
            let text = "x".repeat(len);
            let chunks = chunk_text("doc", &text, 300, 30).unwrap();
            assert_eq!(chunks.len(), expected_count(len, 300, 30), "len = {}", len);
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("doc", "Paris is the capital of France.", 300, 30).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let chunks = chunk_text("doc", &text, 50, 10).unwrap();

        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(40).collect();
            let head: String = pair[1].text.chars().take(10).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_positions_are_sequential() {
        let chunks = chunk_text("doc", &"a".repeat(1000), 200, 50).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i as u32);
            assert_eq!(chunk.source_id, "doc");
        }
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(chunk_text("doc", "", 100, 10).unwrap().is_empty());
        assert!(chunk_text("doc", "  \n\t ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_multibyte_text_is_split_on_chars() {
        let text = "é".repeat(250);
        let chunks = chunk_text("doc", &text, 100, 10).unwrap();

        assert_eq!(chunks.len(), expected_count(250, 100, 10));
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        assert!(matches!(
            chunk_text("doc", "text", 0, 0),
            Err(AppError::Ingestion(_))
        ));
        assert!(matches!(
            chunk_text("doc", "text", 30, 30),
            Err(AppError::Ingestion(_))
        ));
        assert!(matches!(
            chunk_text("doc", "text", 30, 40),
            Err(AppError::Ingestion(_))
        ));
    }
}
