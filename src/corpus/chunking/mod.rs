#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Document, Source};

/// Configuration for document splitting. Sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks; must be smaller than `chunk_size`
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// A bounded slice of a document, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: Source,
    /// Position of this chunk within its document
    pub index: usize,
    /// Number of leading characters repeated from the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// First characters of the chunk on a single line, for logs
    #[inline]
    pub fn preview(&self, max_chars: usize) -> String {
        let flat: String = self
            .text
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .take(max_chars)
            .collect();
        flat.trim().to_string()
    }
}

/// Preferred split points, strongest first
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Line,
    Whitespace,
}

/// Lazy iterator over the chunks of one document
#[derive(Debug)]
pub struct Chunks<'a> {
    document: &'a Document,
    /// Byte offset of every char, plus the text length
    offsets: Vec<usize>,
    size: usize,
    overlap: usize,
    start: usize,
    index: usize,
    finished: bool,
}

/// Split a document into chunks of at most `chunk_size` characters, each
/// sharing exactly `chunk_overlap` characters with its predecessor.
///
/// An overlap that is not smaller than the size is clamped to `size - 1`.
#[inline]
pub fn split<'a>(document: &'a Document, config: &ChunkingConfig) -> Chunks<'a> {
    let size = config.chunk_size.max(1);
    let offsets = document
        .text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(document.text.len()))
        .collect();

    Chunks {
        document,
        offsets,
        size,
        overlap: config.chunk_overlap.min(size - 1),
        start: 0,
        index: 0,
        finished: document.text.is_empty(),
    }
}

impl Chunks<'_> {
    fn char_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn char_at(&self, position: usize) -> char {
        self.document.text[self.offsets[position]..]
            .chars()
            .next()
            .unwrap_or_default()
    }

    fn ends_at(&self, end: usize, boundary: Boundary) -> bool {
        match boundary {
            Boundary::Paragraph => {
                end >= 2 && self.char_at(end - 1) == '\n' && self.char_at(end - 2) == '\n'
            }
            Boundary::Line => self.char_at(end - 1) == '\n',
            Boundary::Whitespace => self.char_at(end - 1).is_whitespace(),
        }
    }

    /// End of the next chunk when the rest of the text does not fit.
    /// Always past `start + overlap` so the next chunk makes progress.
    fn find_end(&self) -> usize {
        let hard_end = self.start + self.size;
        let min_end = self.start + self.overlap + 1;

        for boundary in [Boundary::Paragraph, Boundary::Line, Boundary::Whitespace] {
            if let Some(end) = (min_end..=hard_end)
                .rev()
                .find(|&end| self.ends_at(end, boundary))
            {
                return end;
            }
        }

        hard_end
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let total = self.char_count();
        let end = if total - self.start <= self.size {
            total
        } else {
            self.find_end()
        };

        let chunk = Chunk {
            text: self.document.text[self.offsets[self.start]..self.offsets[end]].to_string(),
            source: self.document.source.clone(),
            index: self.index,
            overlap: if self.index == 0 { 0 } else { self.overlap },
        };

        if end == total {
            self.finished = true;
        } else {
            self.start = end - self.overlap;
        }
        self.index += 1;

        Some(chunk)
    }
}

/// Split every document, dropping whitespace-only chunks
#[inline]
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<Chunk> {
    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|document| split(document, config))
        .filter(|chunk| !chunk.text.trim().is_empty())
        .collect();

    debug!(
        "Split {} documents into {} chunks (size {}, overlap {})",
        documents.len(),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    chunks
}

/// Rebuild the original text from the consecutive chunks of one document
#[inline]
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        text.extend(chunk.text.chars().skip(chunk.overlap));
    }
    text
}
