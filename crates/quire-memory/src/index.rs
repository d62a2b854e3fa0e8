//! Exact nearest-neighbour search over chunk embeddings.

use std::sync::{Arc, PoisonError, RwLock};

use crate::document::Chunk;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("nothing to index")]
    Empty,

    #[error("{chunks} chunks but {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("vector {position} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },
}

/// A retrieved chunk and its squared Euclidean distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Brute-force L2 index. Vector `i` is the embedding of chunk `i`.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

impl FlatIndex {
    /// # Errors
    ///
    /// Fails when there are no chunks, when the two lists differ in length, or when
    /// any vector's dimension differs from the first one.
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        let Some(first) = vectors.first() else {
            return Err(IndexError::Empty);
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(IndexError::Empty);
        }
        if let Some((position, v)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            return Err(IndexError::DimensionMismatch {
                position,
                expected: dimension,
                found: v.len(),
            });
        }
        Ok(Self {
            dimension,
            vectors,
            chunks,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The `min(k, len)` closest chunks, nearest first. Equal distances keep
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if `query` has the wrong dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                position: 0,
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();
        // Stable sort keeps lower positions first among ties.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                distance,
            })
            .collect())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Cosine similarity in `[-1, 1]`; zero when either vector has no magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Holds the active index. Readers get a snapshot; a rebuild swaps in a fully
/// built replacement so queries never observe a partial index.
#[derive(Debug, Default)]
pub struct IndexSlot {
    current: RwLock<Option<Arc<FlatIndex>>>,
}

impl IndexSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, index: FlatIndex) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(index));
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<FlatIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    fn chunk(source: &str, offset: usize) -> Chunk {
        Chunk {
            content: format!("{source}@{offset}"),
            metadata: DocumentMetadata::new(source, "text/plain"),
            chunk_index: 0,
            offset,
        }
    }

    fn three_point_index() -> FlatIndex {
        FlatIndex::build(
            vec![chunk("a.txt", 0), chunk("b.txt", 0), chunk("c.txt", 0)],
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0]],
        )
        .unwrap()
    }

    #[test]
    fn nearest_first() {
        let index = three_point_index();
        let hits = index.search(&[0.9, 0.1], 3).unwrap();
        let sources: Vec<&str> = hits.iter().map(|h| h.chunk.source()).collect();
        assert_eq!(sources, vec!["b.txt", "a.txt", "c.txt"]);
        assert!((hits[0].distance - 0.02).abs() < 1e-6);
    }

    #[test]
    fn k_larger_than_index_returns_all() {
        let index = three_point_index();
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn k_zero_returns_nothing() {
        let index = three_point_index();
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn exact_match_has_zero_distance() {
        let index = three_point_index();
        let hits = index.search(&[5.0, 5.0], 1).unwrap();
        assert_eq!(hits[0].chunk.source(), "c.txt");
        assert!(hits[0].distance.abs() < f32::EPSILON);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = FlatIndex::build(
            vec![chunk("first", 0), chunk("second", 0), chunk("third", 0)],
            vec![vec![1.0], vec![-1.0], vec![1.0]],
        )
        .unwrap();
        let hits = index.search(&[0.0], 3).unwrap();
        let sources: Vec<&str> = hits.iter().map(|h| h.chunk.source()).collect();
        assert_eq!(sources, vec!["first", "second", "third"]);
    }

    #[test]
    fn wrong_query_dimension_rejected() {
        let index = three_point_index();
        assert!(matches!(
            index.search(&[1.0, 2.0, 3.0], 1),
            Err(IndexError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_empty() {
        assert!(matches!(
            FlatIndex::build(Vec::new(), Vec::new()),
            Err(IndexError::Empty)
        ));
    }

    #[test]
    fn build_rejects_length_mismatch() {
        assert!(matches!(
            FlatIndex::build(vec![chunk("a", 0)], vec![vec![1.0], vec![2.0]]),
            Err(IndexError::LengthMismatch {
                chunks: 1,
                vectors: 2
            })
        ));
    }

    #[test]
    fn build_rejects_ragged_vectors() {
        let err = FlatIndex::build(
            vec![chunk("a", 0), chunk("b", 0)],
            vec![vec![1.0, 2.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                position: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn cosine_identical_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn slot_starts_empty() {
        let slot = IndexSlot::new();
        assert!(!slot.is_ready());
        assert!(slot.current().is_none());
    }

    #[test]
    fn slot_replace_swaps_whole_index() {
        let slot = IndexSlot::new();
        slot.replace(three_point_index());
        let before = slot.current().unwrap();

        slot.replace(FlatIndex::build(vec![chunk("new.txt", 0)], vec![vec![0.0, 0.0]]).unwrap());

        assert_eq!(before.len(), 3);
        assert_eq!(slot.current().unwrap().len(), 1);
        slot.clear();
        assert!(!slot.is_ready());
    }
}
