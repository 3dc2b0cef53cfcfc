use crate::chunking::chunk_content;
use crate::config::{
    DEFAULT_CHUNK_SIZE, EXCLUDED_FILE_PATTERNS, EXCLUDED_PATH_PATTERNS, MEMORY_PATTERNS,
};
use crate::error::StoreError;
use crate::frontmatter::extract_tags;
use crate::traits::{Embedder, SegmentMetadata, SegmentRecord, VectorStore};
use anyhow::anyhow;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Length of the hex file identifier used as the segment id prefix.
pub const FILE_ID_LEN: usize = 16;

/// Resolves `path` to its canonical form, following `..` and symlinks.
///
/// The file must exist.
pub fn canonical_path(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|e| anyhow!("Failed to resolve path {:?}: {}", path, e))
}

fn hash_path(canonical: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hex: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    hex[..FILE_ID_LEN].to_string()
}

/// Stable identifier for a memory file: the first 16 hex digits of the
/// SHA-256 of its canonical path, so every spelling of a path agrees.
pub fn file_id(path: &Path) -> anyhow::Result<String> {
    Ok(hash_path(&canonical_path(path)?))
}

/// Per-file progress reported by [`MemoryIndexer::index_all_with`].
#[derive(Debug)]
pub enum IndexEvent<'e> {
    Indexed { file: &'e Path, chunks: usize },
    Failed { file: &'e Path, error: &'e anyhow::Error },
}

/// A file that failed to index during a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexError {
    pub file: String,
    pub error: String,
}

/// A file indexed during a batch run and how many segments it produced.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedFile {
    pub file: String,
    pub chunks: usize,
}

/// Outcome of [`MemoryIndexer::index_all`].
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
    pub files_processed: usize,
    pub total_chunks: usize,
    pub indexed: Vec<IndexedFile>,
    pub errors: Vec<IndexError>,
}

impl IndexReport {
    fn add_success(&mut self, file_path: &Path, chunks: usize) {
        self.files_processed += 1;
        self.total_chunks += chunks;
        self.indexed.push(IndexedFile {
            file: file_path.to_string_lossy().to_string(),
            chunks,
        });
    }

    fn add_failure(&mut self, file_path: &Path, error: &anyhow::Error) {
        self.errors.push(IndexError {
            file: file_path.to_string_lossy().to_string(),
            error: error.to_string(),
        });
        warn!("Failed to index file {:?}: {}", file_path, error);
    }
}

fn build_globset(patterns: &[&str], literal_separator: bool) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(literal_separator)
            .build()
            .map_err(|e| anyhow!("Invalid glob pattern {}: {}", pattern, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| anyhow!("Failed to build glob set: {}", e))
}

/// Lists the memory files a full reindex covers, sorted by path.
///
/// Matches `profiles/*.md`, `core/*.md`, `knowledge/*.md` and
/// `sessions/daily/*.md` under `memory_root`, skipping `*-summary.md` files
/// and anything with `archive` in its relative path. A missing root yields
/// no files.
pub fn discover_memory_files(memory_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let include = build_globset(MEMORY_PATTERNS, true)?;
    let exclude_name = build_globset(EXCLUDED_FILE_PATTERNS, true)?;
    let exclude_path = build_globset(EXCLUDED_PATH_PATTERNS, false)?;

    let mut files: Vec<PathBuf> = WalkDir::new(memory_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let Ok(relative) = path.strip_prefix(memory_root) else {
                return false;
            };
            let excluded = path
                .file_name()
                .is_some_and(|name| exclude_name.is_match(Path::new(name)))
                || exclude_path.is_match(relative);
            include.is_match(relative) && !excluded
        })
        .collect();
    files.sort();
    debug!(
        "Discovered {} memory file(s) under {:?}",
        files.len(),
        memory_root
    );
    Ok(files)
}

/// Chunks, embeds and stores memory files.
pub struct MemoryIndexer<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
    chunk_size: usize,
}

impl<'a> MemoryIndexer<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self {
            embedder,
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Re-indexes one file and returns the number of non-blank segments written.
    ///
    /// Every segment previously stored for the file is removed first, so a
    /// file that shrank leaves nothing stale behind.
    pub fn index_file(&self, path: &Path) -> anyhow::Result<usize> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {:?}: {}", path, e))?;

        let canonical = canonical_path(path)?;
        let file_id = hash_path(&canonical);
        let source = canonical.to_string_lossy().to_string();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tags = extract_tags(&content).join(",");
        let chunks = chunk_content(&content, self.chunk_size);

        match self.store.delete_file(&file_id) {
            Ok(removed) => debug!("Removed {} stale segment(s) for {}", removed, source),
            Err(StoreError::NotFound(_)) => debug!("No previous segments for {}", source),
            Err(e) => return Err(e.into()),
        }

        let mut written = 0;
        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            let embedding = self.embedder.embed_text(chunk)?;
            let record = SegmentRecord {
                id: format!("{file_id}_{index}"),
                file_id: file_id.clone(),
                document: chunk.clone(),
                metadata: SegmentMetadata {
                    source: source.clone(),
                    filename: filename.clone(),
                    chunk_index: index,
                    tags: tags.clone(),
                    total_chunks: chunks.len(),
                    embedded_at: chrono::Local::now().to_rfc3339(),
                },
                embedding,
            };
            self.store.upsert(&record)?;
            written += 1;
        }

        info!("Indexed {} ({} chunks)", source, written);
        Ok(written)
    }

    /// Re-indexes every memory file under `memory_root`.
    ///
    /// A failing file is recorded in the report and the batch carries on.
    pub fn index_all(&self, memory_root: &Path) -> anyhow::Result<IndexReport> {
        self.index_all_with(memory_root, |_| {})
    }

    /// Like [`index_all`](Self::index_all), calling `on_file` as each file finishes.
    pub fn index_all_with<F>(&self, memory_root: &Path, mut on_file: F) -> anyhow::Result<IndexReport>
    where
        F: FnMut(IndexEvent<'_>),
    {
        let mut report = IndexReport::default();
        let files = discover_memory_files(memory_root)?;
        info!(
            "Found {} memory file(s) to index with model {}",
            files.len(),
            self.embedder.model_name()
        );

        for file_path in &files {
            match self.index_file(file_path) {
                Ok(chunks) => {
                    report.add_success(file_path, chunks);
                    on_file(IndexEvent::Indexed {
                        file: file_path,
                        chunks,
                    });
                }
                Err(e) => {
                    report.add_failure(file_path, &e);
                    on_file(IndexEvent::Failed {
                        file: file_path,
                        error: &e,
                    });
                }
            }
        }

        info!(
            "Completed indexing {} file(s) ({} succeeded, {} failed, {} chunks)",
            files.len(),
            report.files_processed,
            report.errors.len(),
            report.total_chunks
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::SqliteVectorStore;
    use tempfile::TempDir;

    /// Deterministic embedder: a bag of lowercase letters.
    struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        fn model_name(&self) -> &str {
            "letters"
        }

        fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.chars().filter(|c| c.is_ascii_lowercase()) {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn create_test_store(temp_dir: &TempDir) -> SqliteVectorStore {
        SqliteVectorStore::open(&temp_dir.path().join("store")).expect("Failed to open store")
    }

    #[test]
    fn test_file_id_is_stable_and_fixed_length() {
        let temp_dir = TempDir::new().unwrap();
        let identity = write_file(temp_dir.path(), "core/identity.md", b"x");
        let other = write_file(temp_dir.path(), "core/other.md", b"x");

        let a = file_id(&identity).unwrap();
        let b = file_id(&identity).unwrap();
        let c = file_id(&other).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), FILE_ID_LEN);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_id_ignores_path_spelling() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(temp_dir.path(), "core/x.md", b"x");
        let dotted = temp_dir.path().join("core").join("..").join("core").join("x.md");

        assert_eq!(file_id(&path).unwrap(), file_id(&dotted).unwrap());
    }

    #[test]
    fn test_file_id_of_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(file_id(&temp_dir.path().join("missing.md")).is_err());
    }

    #[test]
    fn test_reindex_through_other_spelling_replaces_segments() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let root = temp_dir.path().join("memory");
        let path = write_file(&root, "core/x.md", b"# X\nsome content\n");
        let dotted = root.join("core").join("..").join("core").join("x.md");

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        assert_eq!(indexer.index_file(&path).unwrap(), 1);
        assert_eq!(indexer.index_file(&dotted).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 1);

        let id = format!("{}_0", file_id(&path).unwrap());
        let hit = store.get(&id).unwrap().unwrap();
        assert_eq!(
            Path::new(&hit.metadata.source),
            std::fs::canonicalize(&path).unwrap().as_path()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_shares_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(temp_dir.path(), "core/x.md", b"x");
        let link = temp_dir.path().join("link.md");
        std::os::unix::fs::symlink(&path, &link).unwrap();

        assert_eq!(file_id(&path).unwrap(), file_id(&link).unwrap());
    }

    #[test]
    fn test_index_file_writes_segments_with_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let path = write_file(
            temp_dir.path(),
            "core/identity.md",
            b"---\ntags: [core, self]\n---\n# Identity\nI am a test agent.\n",
        );

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        assert_eq!(indexer.index_file(&path).unwrap(), 1);

        let id = format!("{}_0", file_id(&path).unwrap());
        let hit = store.get(&id).unwrap().expect("segment stored");
        assert_eq!(hit.metadata.filename, "identity.md");
        assert_eq!(hit.metadata.tags, "core,self");
        assert_eq!(hit.metadata.chunk_index, 0);
        assert_eq!(hit.metadata.total_chunks, 1);
        assert!(hit.metadata.source.ends_with("identity.md"));
        assert!(chrono::DateTime::parse_from_rfc3339(&hit.metadata.embedded_at).is_ok());
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let body: String = (0..40).map(|i| format!("line number {i} of the note\n")).collect();
        let path = write_file(temp_dir.path(), "knowledge/long.md", body.as_bytes());

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store).with_chunk_size(100);
        let first = indexer.index_file(&path).unwrap();
        let second = indexer.index_file(&path).unwrap();

        assert!(first > 1);
        assert_eq!(first, second);
        assert_eq!(store.count().unwrap(), first as i64);
    }

    #[test]
    fn test_reindex_shrunk_file_leaves_no_stale_segments() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        // more segments than any fixed guess would cover
        let body: String = (0..150).map(|i| format!("entry {i}\n")).collect();
        let path = write_file(temp_dir.path(), "sessions/daily/2026-01-01.md", body.as_bytes());

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store).with_chunk_size(1);
        let first = indexer.index_file(&path).unwrap();
        assert!(first > 100);

        std::fs::write(&path, "just one line\n").unwrap();
        assert_eq!(indexer.index_file(&path).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.segment_ids(&file_id(&path).unwrap()).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_segments_are_skipped_but_counted() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let path = write_file(temp_dir.path(), "core/gaps.md", b"aaaa\n\n\n\nbbbb");

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store).with_chunk_size(3);
        // "aaaa" | "\n\n" | "bbbb": the blank middle segment is not stored
        assert_eq!(indexer.index_file(&path).unwrap(), 2);

        let fid = file_id(&path).unwrap();
        let ids = store.segment_ids(&fid).unwrap();
        assert_eq!(ids, vec![format!("{fid}_0"), format!("{fid}_2")]);
        let hit = store.get(&ids[1]).unwrap().unwrap();
        assert_eq!(hit.document, "bbbb");
        assert_eq!(hit.metadata.total_chunks, 3);
    }

    #[test]
    fn test_empty_file_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let path = write_file(temp_dir.path(), "core/empty.md", b"");

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        assert_eq!(indexer.index_file(&path).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_index_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        assert!(indexer.index_file(&temp_dir.path().join("nope.md")).is_err());
    }

    #[test]
    fn test_discover_memory_files_applies_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(root, "profiles/user.md", b"x");
        write_file(root, "core/identity.md", b"x");
        write_file(root, "knowledge/rust.md", b"x");
        write_file(root, "knowledge/weekly-summary.md", b"x");
        write_file(root, "knowledge/archive-2025.md", b"x");
        write_file(root, "knowledge/nested/deep.md", b"x");
        write_file(root, "knowledge/notes.txt", b"x");
        write_file(root, "sessions/daily/2026-01-01.md", b"x");
        write_file(root, "sessions/weekly/2026-w01.md", b"x");
        write_file(root, "README.md", b"x");

        let files = discover_memory_files(root).unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            relative,
            vec![
                "core/identity.md",
                "knowledge/rust.md",
                "profiles/user.md",
                "sessions/daily/2026-01-01.md",
            ]
        );
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let files = discover_memory_files(&temp_dir.path().join("missing")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_index_all_records_failures_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("memory");
        write_file(&root, "core/identity.md", b"# Identity\nhello\n");
        write_file(&root, "knowledge/rust.md", b"# Rust\nownership and borrowing\n");
        // invalid UTF-8 cannot be read as text
        write_file(&root, "profiles/broken.md", &[0xff, 0xfe, 0x00, 0x80]);

        let store = create_test_store(&temp_dir);
        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        let report = indexer.index_all(&root).unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.total_chunks, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].file.ends_with("broken.md"));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_index_all_with_reports_each_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("memory");
        write_file(&root, "core/identity.md", b"# Identity\nhello\n");
        write_file(&root, "profiles/broken.md", &[0xff, 0xfe]);

        let store = create_test_store(&temp_dir);
        let indexer = MemoryIndexer::new(&LetterEmbedder, &store);
        let mut seen = Vec::new();
        let report = indexer
            .index_all_with(&root, |event| match event {
                IndexEvent::Indexed { file, chunks } => {
                    seen.push(format!("ok {} {}", file.file_name().unwrap().to_string_lossy(), chunks))
                }
                IndexEvent::Failed { file, .. } => {
                    seen.push(format!("err {}", file.file_name().unwrap().to_string_lossy()))
                }
            })
            .unwrap();

        assert_eq!(seen, vec!["ok identity.md 1", "err broken.md"]);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.errors.len(), 1);
    }
}
