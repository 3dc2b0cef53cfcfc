use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Metadata stored alongside every segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Path of the memory file the segment came from.
    pub source: String,
    pub filename: String,
    /// Position of the segment within its file, counting blank segments.
    pub chunk_index: usize,
    /// Comma-joined tag list from the file's front matter.
    pub tags: String,
    pub total_chunks: usize,
    /// RFC 3339 timestamp of when the segment was embedded.
    pub embedded_at: String,
}

/// A segment ready to be written to the collection.
#[derive(Debug, Clone)]
pub struct SegmentRecord {
    /// `{file_id}_{chunk_index}`
    pub id: String,
    pub file_id: String,
    pub document: String,
    pub metadata: SegmentMetadata,
    pub embedding: Vec<f32>,
}

/// One nearest-neighbour hit returned by [`VectorStore::query`].
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: SegmentMetadata,
    /// Squared Euclidean distance to the query vector.
    pub distance: f64,
}

/// Trait for turning text into embedding vectors.
pub trait Embedder {
    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Trait for the persistent collection of segment vectors.
pub trait VectorStore {
    /// Inserts the record or replaces the one stored under the same id.
    fn upsert(&self, record: &SegmentRecord) -> Result<(), StoreError>;
    /// Removes every segment belonging to `file_id`, returning how many were removed.
    ///
    /// Returns [`StoreError::NotFound`] when the file has no stored segments.
    fn delete_file(&self, file_id: &str) -> Result<usize, StoreError>;
    /// Returns up to `n_results` hits ordered by ascending distance.
    fn query(&self, embedding: &[f32], n_results: usize) -> Result<Vec<QueryHit>, StoreError>;
    fn count(&self) -> Result<i64, StoreError>;
}
