use std::path::PathBuf;

/// Outcome of a failed vector store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no segments stored for file id {0}")]
    NotFound(String),

    #[error("vector store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("vector store does not exist at {0}")]
    Missing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt segment metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}
