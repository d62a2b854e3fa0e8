#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    #[error("index error: {0}")]
    Index(#[from] crate::index::IndexError),

    #[error("LLM error: {0}")]
    Llm(#[from] quire_llm::LlmError),
}
