//! # memvec
//!
//! Semantic search over a markdown memory tree, built in Rust with local
//! vector embeddings and SQLite storage.
//!
//! ## Features
//!
//! - Line-based chunking of memory files into bounded segments
//! - Tag extraction from `---` front matter
//! - Local embeddings with the all-MiniLM-L6-v2 model (FastEmbed)
//! - A persistent SQLite vector collection with nearest-neighbour queries
//! - Per-file ranked search results
//! - Both library and CLI interfaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memvec::{LocalEmbedder, MemoryDirs, MemoryIndexer, MemorySearcher, SqliteVectorStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dirs = MemoryDirs::with_memory_root("/home/agent/memory");
//!
//! // The model and the store are built once and shared
//! let embedder = LocalEmbedder::new_with_default_model()?;
//! let store = SqliteVectorStore::open(&dirs.store_path())?;
//!
//! // Reindex the whole memory tree
//! let report = MemoryIndexer::new(&embedder, &store).index_all(&dirs.memory_root())?;
//! println!("{} files, {} chunks", report.files_processed, report.total_chunks);
//!
//! // Search
//! for file in MemorySearcher::new(&embedder, &store).search("rust ownership", Some(5))? {
//!     println!("{} ({:.4})", file.source, file.min_distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub use traits::{Embedder, QueryHit, SegmentMetadata, SegmentRecord, VectorStore};

pub mod config;
pub use config::MemoryDirs;

pub mod error;
pub use error::StoreError;

pub mod chunking;
pub mod frontmatter;

pub mod embed;
pub use embed::LocalEmbedder;

pub mod engines;
pub use engines::SqliteVectorStore;

pub mod indexer;
pub use indexer::{IndexReport, MemoryIndexer};

pub mod search;
pub use search::{FileMatch, MemorySearcher};

pub mod status;
pub use status::{StatusReport, collect_status};
