#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("no text extracted from {0}")]
    EmptyContent(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("invalid splitter config: chunk_size={chunk_size}, chunk_overlap={chunk_overlap}")]
    InvalidSplitter {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}
