//! Text chunking
//!
//! Splits extracted document text into chunks with stable, deterministic
//! boundaries: the same text and configuration always yield the same chunk
//! sequence, which keeps vector-index upserts and cache population idempotent.
//! Breaks prefer paragraph over sentence over word boundaries.

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;

/// A contiguous span of a document's extracted text
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The actual text content
    pub text: String,

    /// Chunk index (0-based)
    pub index: usize,

    /// Byte start position in the original text
    pub char_start: usize,

    /// Byte end position in the original text
    pub char_end: usize,
}

/// Split text into chunks
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<TextChunk> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let break_points = find_break_points(text);

    let mut chunks = Vec::new();
    let mut current_start = 0;
    let mut index = 0;

    while current_start < text.len() {
        current_start = ensure_char_boundary(text, current_start);
        if current_start >= text.len() {
            break;
        }

        let target_end = current_start + config.max_chars;
        let chunk_end = if target_end >= text.len() {
            text.len()
        } else {
            find_best_break(text, current_start, &break_points, config)
        };

        let chunk_end = ensure_char_boundary(text, chunk_end);
        if chunk_end <= current_start {
            break;
        }

        let chunk_str = text[current_start..chunk_end].trim();

        // Skip tiny fragments unless this is the last chunk
        if (chunk_str.len() >= config.min_chars || chunk_end >= text.len())
            && !chunk_str.is_empty()
        {
            chunks.push(TextChunk {
                text: chunk_str.to_string(),
                index,
                char_start: current_start,
                char_end: chunk_end,
            });
            index += 1;
        }

        if chunk_end >= text.len() {
            break;
        }

        // Step back for overlap, but always make forward progress
        let next_start = if chunk_end > current_start + config.overlap_chars {
            chunk_end - config.overlap_chars
        } else {
            chunk_end
        };
        current_start = next_start.max(current_start + 1);
    }

    chunks
}

/// Ensure a position is on a valid UTF-8 character boundary
fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Find the best break point near the target chunk size
fn find_best_break(
    text: &str,
    start: usize,
    break_points: &[BreakPoint],
    config: &ChunkConfig,
) -> usize {
    // Search window: 60% to 100% of the target chunk size
    let min_pos = start + (config.max_chars * 3 / 5);
    let max_pos = std::cmp::min(start + config.max_chars, text.len());

    let best = break_points
        .iter()
        .filter(|p| p.position > start && p.position >= min_pos && p.position <= max_pos)
        .max_by_key(|p| (p.priority, p.position));

    match best {
        Some(p) => p.position,
        // No usable boundary: hard cut at the target size
        None => ensure_char_boundary(text, max_pos),
    }
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
