//! Document ingestion, sliding-window chunking, and an in-memory vector index.

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;

pub use error::MemoryError;
pub use index::{FlatIndex, IndexError, IndexSlot, ScoredChunk, cosine_similarity};
pub use indexer::build_index;
