use quire_llm::LlmProvider;

use crate::document::Chunk;
use crate::error::MemoryError;
use crate::index::FlatIndex;

/// Embeddings requested per provider call.
pub const DEFAULT_EMBED_BATCH: usize = 32;

/// Embed every chunk and build a fresh index. Vector `i` belongs to chunk `i`.
///
/// # Errors
///
/// Returns an error if any embedding request fails or the vectors are unusable
/// (no chunks, ragged dimensions). Nothing partial is returned.
pub async fn build_index<P: LlmProvider>(
    provider: &P,
    chunks: Vec<Chunk>,
    batch_size: usize,
) -> Result<FlatIndex, MemoryError> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(chunks.len());

    for (n, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embedded = provider.embed_batch(&texts).await?;
        if embedded.len() != texts.len() {
            return Err(quire_llm::LlmError::EmbeddingCount {
                sent: texts.len(),
                received: embedded.len(),
            }
            .into());
        }
        tracing::debug!(batch = n, size = texts.len(), "embedded chunk batch");
        vectors.extend(embedded);
    }

    let index = FlatIndex::build(chunks, vectors)?;
    tracing::info!(
        chunks = index.len(),
        dimension = index.dimension(),
        provider = provider.name(),
        "index built"
    );
    Ok(index)
}
