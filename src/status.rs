use crate::config::{MODEL_NAME, store_path_for};
use crate::engines::SqliteVectorStore;
use crate::traits::VectorStore;
use log::debug;
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Diagnostics printed by `memvec status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub store_path: String,
    pub store_exists: bool,
    pub model: String,
    /// Every `*.md` file anywhere under the memory root.
    pub memory_files: usize,
    pub total_size_mb: f64,
    pub collection_count: i64,
}

impl StatusReport {
    /// Report fields as `(name, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("store_path", self.store_path.clone()),
            ("store_exists", self.store_exists.to_string()),
            ("model", self.model.clone()),
            ("memory_files", self.memory_files.to_string()),
            ("total_size_mb", self.total_size_mb.to_string()),
            ("collection_count", self.collection_count.to_string()),
        ]
    }
}

fn count_markdown_files(memory_root: &Path) -> usize {
    WalkDir::new(memory_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("md")
        })
        .count()
}

fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Gathers store and memory tree diagnostics without creating anything on disk.
///
/// A store that cannot be opened or counted reports a collection count of 0.
pub fn collect_status(memory_root: &Path) -> StatusReport {
    let store_path = store_path_for(memory_root);
    let store_exists = store_path.exists();

    let total_size_mb = if store_exists {
        bytes_to_mb(directory_size(&store_path))
    } else {
        0.0
    };

    let collection_count = match SqliteVectorStore::open_existing(&store_path)
        .and_then(|store| store.count())
    {
        Ok(count) => count,
        Err(e) => {
            debug!("Could not count collection segments: {}", e);
            0
        }
    };

    StatusReport {
        store_path: store_path.to_string_lossy().to_string(),
        store_exists,
        model: MODEL_NAME.to_string(),
        memory_files: count_markdown_files(memory_root),
        total_size_mb,
        collection_count,
    }
}
