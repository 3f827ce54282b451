//! Text chunking with configurable size and overlap.
//!
//! Splitting is delegated to `text-splitter`, which descends through
//! paragraph breaks, line breaks, sentences, words and finally graphemes until
//! every piece fits. Sizes are measured in characters.

use coursebrief_core::config::MIN_CHUNK_SIZE;
use coursebrief_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Split `text` into chunks of at most `max_size` characters, adjacent chunks
/// sharing up to `overlap` characters.
///
/// Empty or whitespace-only input yields no chunks.
pub fn chunk(text: &str, max_size: usize, overlap: usize) -> AppResult<Vec<String>> {
    if max_size < MIN_CHUNK_SIZE {
        return Err(AppError::Config(format!(
            "Chunk size must be at least {} characters, got {}",
            MIN_CHUNK_SIZE, max_size
        )));
    }
    if overlap >= max_size {
        return Err(AppError::Config(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, max_size
        )));
    }

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let config = ChunkConfig::new(max_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))?
        .with_trim(true);
    let splitter = TextSplitter::new(config);

    let chunks: Vec<String> = splitter
        .chunks(text)
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!(
        "Chunked {} characters into {} chunks (size: {}, overlap: {})",
        text.chars().count(),
        chunks.len(),
        max_size,
        overlap
    );

    Ok(chunks)
}
