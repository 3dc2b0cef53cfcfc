use crate::config::DEFAULT_SEARCH_LIMIT;
use crate::traits::{Embedder, VectorStore};
use log::debug;
use serde::Serialize;

/// Characters of segment text kept in a preview.
pub const PREVIEW_CHARS: usize = 200;

/// A matching segment inside a [`FileMatch`].
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub content: String,
    pub distance: f64,
}

/// Search hits for one memory file.
#[derive(Debug, Clone, Serialize)]
pub struct FileMatch {
    pub source: String,
    /// Distance of the closest segment of this file.
    pub min_distance: f64,
    pub tags: String,
    /// Matching segments, closest first.
    pub chunks: Vec<ChunkPreview>,
}

/// Truncates `text` to `max_chars` characters, appending `...` when shortened.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Semantic search over the indexed memory segments, grouped per file.
pub struct MemorySearcher<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
}

impl<'a> MemorySearcher<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self { embedder, store }
    }

    /// Returns up to `limit` files (default 5) ordered by their closest segment.
    ///
    /// Twice `limit` segments are fetched so that files contributing several
    /// segments still leave room for others.
    pub fn search(&self, query: &str, limit: Option<usize>) -> anyhow::Result<Vec<FileMatch>> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let query_embedding = self.embedder.embed_text(query)?;
        let hits = self.store.query(&query_embedding, limit.saturating_mul(2))?;
        debug!(
            "Search for query '{}' returned {} segment(s).",
            query,
            hits.len()
        );

        let mut files: Vec<FileMatch> = Vec::new();
        for hit in hits {
            let chunk = ChunkPreview {
                content: preview(&hit.document, PREVIEW_CHARS),
                distance: hit.distance,
            };
            match files.iter_mut().find(|f| f.source == hit.metadata.source) {
                Some(file) => {
                    file.min_distance = file.min_distance.min(hit.distance);
                    file.chunks.push(chunk);
                }
                None => files.push(FileMatch {
                    source: hit.metadata.source,
                    min_distance: hit.distance,
                    tags: hit.metadata.tags,
                    chunks: vec![chunk],
                }),
            }
        }

        files.sort_by(|a, b| a.min_distance.total_cmp(&b.min_distance));
        files.truncate(limit);
        Ok(files)
    }
}
