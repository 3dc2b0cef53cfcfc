use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Identifier of the sentence-embedding model used for every segment and query.
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Name of the single collection holding all memory segments.
pub const COLLECTION_NAME: &str = "memory";

/// Maximum segment size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Number of files returned by a search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Directory patterns, relative to the memory root, scanned by a full reindex.
pub const MEMORY_PATTERNS: &[&str] = &[
    "profiles/*.md",
    "core/*.md",
    "knowledge/*.md",
    "sessions/daily/*.md",
];

/// Patterns matched against the file name; matching files are never indexed.
pub const EXCLUDED_FILE_PATTERNS: &[&str] = &["*-summary.md"];

/// Patterns matched against the path relative to the memory root.
pub const EXCLUDED_PATH_PATTERNS: &[&str] = &["*archive*"];

/// Configuration for memvec project directories
pub struct MemoryDirs {
    project_dirs: Option<ProjectDirs>,
    memory_root: Option<PathBuf>,
}

impl MemoryDirs {
    /// Create a new MemoryDirs instance rooted at the platform data directory
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("com", "memvec", "memvec");
        Self {
            project_dirs,
            memory_root: None,
        }
    }

    /// Create a MemoryDirs instance with an explicit memory root
    pub fn with_memory_root(memory_root: impl Into<PathBuf>) -> Self {
        Self {
            memory_root: Some(memory_root.into()),
            ..Self::new()
        }
    }

    /// Root of the memory tree (`profiles/`, `core/`, `knowledge/`, `sessions/`)
    pub fn memory_root(&self) -> PathBuf {
        if let Some(root) = &self.memory_root {
            return root.clone();
        }
        match &self.project_dirs {
            Some(dirs) => dirs.data_dir().join("memory"),
            None => {
                // Fallback to current directory if ProjectDirs fails
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join("memory")
            }
        }
    }

    /// Directory holding the persistent vector store
    pub fn store_path(&self) -> PathBuf {
        store_path_for(&self.memory_root())
    }

    /// Get the default cache directory for downloaded embedding models
    pub fn model_cache_dir(&self) -> PathBuf {
        match &self.project_dirs {
            Some(dirs) => dirs.cache_dir().to_path_buf(),
            None => {
                // Fallback to current directory if ProjectDirs fails
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(".cache")
            }
        }
    }

    /// Ensure the model cache directory exists
    pub fn ensure_model_cache_dir(&self) -> std::io::Result<PathBuf> {
        let cache_dir = self.model_cache_dir();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(cache_dir)
    }
}

impl Default for MemoryDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Store directory for a given memory root: `<root>/cache/vectors`.
pub fn store_path_for(memory_root: &Path) -> PathBuf {
    memory_root.join("cache").join("vectors")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_memory_root() {
        let dirs = MemoryDirs::with_memory_root("/tmp/agent/memory");
        assert_eq!(dirs.memory_root(), PathBuf::from("/tmp/agent/memory"));
        assert_eq!(
            dirs.store_path(),
            PathBuf::from("/tmp/agent/memory/cache/vectors")
        );
    }

    #[test]
    fn test_default_memory_root_ends_with_memory() {
        let dirs = MemoryDirs::new();
        assert!(dirs.memory_root().ends_with("memory"));
    }
}
