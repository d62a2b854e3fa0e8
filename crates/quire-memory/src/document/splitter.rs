use super::error::DocumentError;
use super::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows. Must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

impl SplitterConfig {
    /// Distance between consecutive chunk starts.
    #[must_use]
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidSplitter`] when the window is empty or the
    /// overlap would keep the window from advancing.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(DocumentError::InvalidSplitter {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }
}

/// Fixed-size sliding-window splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns an error if `config` fails [`SplitterConfig::validate`].
    pub fn new(config: SplitterConfig) -> Result<Self, DocumentError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> SplitterConfig {
        self.config
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        split_windows(
            &document.content,
            self.config.chunk_size,
            self.config.step(),
        )
        .into_iter()
        .enumerate()
        .map(|(i, (offset, content))| Chunk {
            content,
            metadata: document.metadata.clone(),
            chunk_index: i,
            offset,
        })
        .collect()
    }

    /// Split every document, preserving document order.
    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }
}

/// Windows of `size` characters starting every `step` characters, as `(offset, text)`.
fn split_windows(text: &str, size: usize, step: usize) -> Vec<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut windows = Vec::with_capacity(chars.len() / step.max(1) + 1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        windows.push((start, chars[start..end].iter().collect()));
        start += step;
    }

    windows
}
