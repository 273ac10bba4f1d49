use log::debug;

use crate::document::{Provenance, Segment};
use crate::error::ChunkError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Represents a text chunk with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The actual text content of this chunk
    pub text: String,
    /// Page the chunk was cut from
    pub provenance: Provenance,
    /// Starting position (in characters) of this chunk within its page
    pub start_position: usize,
    /// Insertion order across the whole document
    pub chunk_index: usize,
}

/// Sizes are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Preferred cut point
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }
}

/// Split every segment into overlapping chunks.
///
/// Segments are chunked independently, so a chunk never spans two pages.
/// Within a segment consecutive chunks share exactly `chunk_overlap`
/// characters, and no chunk is longer than `chunk_size`.
pub fn split_segments(
    segments: &[Segment],
    config: &ChunkingConfig,
) -> Result<Vec<TextChunk>, ChunkError> {
    config.validate()?;
    if segments.is_empty() {
        return Err(ChunkError::NoSegments);
    }

    let mut chunks = Vec::new();
    for segment in segments {
        for (start_position, text) in split_text(&segment.text, config) {
            chunks.push(TextChunk {
                text,
                provenance: segment.provenance.clone(),
                start_position,
                chunk_index: chunks.len(),
            });
        }
    }

    debug!(
        "Split {} segment(s) into {} chunks",
        segments.len(),
        chunks.len()
    );
    Ok(chunks)
}

/// Sliding-window split of one text, returning `(char offset, chunk)` pairs.
///
/// Each window is cut right after the last separator it contains, as long as
/// that cut lies past the overlap; otherwise the window is cut hard at
/// `chunk_size`. The next window starts `chunk_overlap` characters before
/// the cut.
fn split_text(text: &str, config: &ChunkingConfig) -> Vec<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let separator: Vec<char> = config.separator.chars().collect();
    let size = config.chunk_size;
    let overlap = config.chunk_overlap;

    let mut pieces = Vec::new();
    if chars.is_empty() {
        return pieces;
    }

    let mut start = 0;
    loop {
        if chars.len() - start <= size {
            pieces.push((start, chars[start..].iter().collect()));
            break;
        }

        let window_end = start + size;
        let end = last_separator_cut(&chars[..window_end], &separator, start + overlap)
            .unwrap_or(window_end);

        pieces.push((start, chars[start..end].iter().collect()));
        start = end - overlap;
    }

    pieces
}

/// Position just after the last separator in `chars` that lies strictly
/// beyond `min_cut`.
fn last_separator_cut(chars: &[char], separator: &[char], min_cut: usize) -> Option<usize> {
    if separator.is_empty() || chars.len() < separator.len() {
        return None;
    }

    (0..=chars.len() - separator.len())
        .rev()
        .map(|pos| (pos, pos + separator.len()))
        .take_while(|&(_, cut)| cut > min_cut)
        .find(|&(pos, _)| chars[pos..].starts_with(separator))
        .map(|(_, cut)| cut)
}
