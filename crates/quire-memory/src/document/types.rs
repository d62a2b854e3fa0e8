#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// File name the text came from, used for citations.
    pub source: String,
    pub content_type: String,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// A window of one document's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Position of this chunk within its document.
    pub chunk_index: usize,
    /// Character (not byte) offset of the first character in the source text.
    pub offset: usize,
}

impl Chunk {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    /// Number of characters in the chunk.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
