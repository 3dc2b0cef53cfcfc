use crate::config::COLLECTION_NAME;
use crate::error::StoreError;
use crate::traits::{QueryHit, SegmentRecord, VectorStore};
use log::{debug, info};
use rusqlite::Connection;
use std::path::Path;

/// File name of the database inside the store directory.
pub const DB_FILE_NAME: &str = "memory.db";

/// SQLite-backed vector collection for memory segments.
///
/// Vectors are kept as little-endian `f32` blobs and compared by brute force
/// on query; the memory tree is small enough that no ANN index is needed.
pub struct SqliteVectorStore {
    conn: Connection,
}

impl SqliteVectorStore {
    /// Opens the store under `store_dir`, creating the directory and schema if needed.
    pub fn open(store_dir: &Path) -> Result<Self, StoreError> {
        info!("Opening vector store at: {}", store_dir.display());
        std::fs::create_dir_all(store_dir)?;
        let store = Self::connect(store_dir)?;
        store.create_table()?;
        info!(
            "Vector store ready: {} (collection '{}')",
            store_dir.display(),
            COLLECTION_NAME
        );
        Ok(store)
    }

    /// Opens a store that must already exist on disk; never creates anything.
    pub fn open_existing(store_dir: &Path) -> Result<Self, StoreError> {
        if !store_dir.join(DB_FILE_NAME).is_file() {
            return Err(StoreError::Missing(store_dir.to_path_buf()));
        }
        let store = Self::connect(store_dir)?;
        store.create_table()?;
        Ok(store)
    }

    /// Deletes the whole store directory. Returns `false` if there was nothing to delete.
    pub fn destroy(store_dir: &Path) -> std::io::Result<bool> {
        if !store_dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(store_dir)?;
        info!("Removed vector store at: {}", store_dir.display());
        Ok(true)
    }

    fn connect(store_dir: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(store_dir.join(DB_FILE_NAME))?;
        Ok(SqliteVectorStore { conn })
    }

    /// Creates the segment table and its file id index.
    pub fn create_table(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS memory_segments (
                    id TEXT PRIMARY KEY,
                    file_id TEXT NOT NULL,
                    document TEXT NOT NULL,
                    metadata TEXT NOT NULL,
                    embedding BLOB NOT NULL
                )",
            [],
        )?;
        debug!("Created memory_segments table if it did not exist.");

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS memory_segments_file_id ON memory_segments(file_id)",
            [],
        )?;
        debug!("Created memory_segments_file_id index if it did not exist.");
        Ok(())
    }

    /// Returns the stored record for `id`, if any.
    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Result<Option<QueryHit>, StoreError> {
        use rusqlite::OptionalExtension;

        let row = self
            .conn
            .query_row(
                "SELECT document, metadata FROM memory_segments WHERE id = ?1",
                rusqlite::params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match row {
            Some((document, metadata)) => Ok(Some(QueryHit {
                id: id.to_string(),
                document,
                metadata: serde_json::from_str(&metadata)?,
                distance: 0.0,
            })),
            None => Ok(None),
        }
    }

    /// Ids of every segment stored for `file_id`, in index order.
    #[cfg(test)]
    pub(crate) fn segment_ids(&self, file_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, metadata FROM memory_segments WHERE file_id = ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![file_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut ids = Vec::new();
        for row in rows {
            let (id, metadata) = row?;
            let metadata: crate::traits::SegmentMetadata = serde_json::from_str(&metadata)?;
            ids.push((metadata.chunk_index, id));
        }
        ids.sort();
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    fn squared_l2_distance(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() {
            return f64::INFINITY;
        }
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = (x - y) as f64;
                d * d
            })
            .sum()
    }

    fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

impl VectorStore for SqliteVectorStore {
    fn upsert(&self, record: &SegmentRecord) -> Result<(), StoreError> {
        let metadata_str = serde_json::to_string(&record.metadata)?;
        let rows_affected = self.conn.execute(
            "INSERT INTO memory_segments (id, file_id, document, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    file_id = excluded.file_id,
                    document = excluded.document,
                    metadata = excluded.metadata,
                    embedding = excluded.embedding",
            rusqlite::params![
                record.id,
                record.file_id,
                record.document,
                metadata_str,
                Self::encode_embedding(&record.embedding)
            ],
        )?;
        debug!(
            "Upserted segment {}. Number of rows affected: {}",
            record.id, rows_affected
        );
        Ok(())
    }

    fn delete_file(&self, file_id: &str) -> Result<usize, StoreError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM memory_segments WHERE file_id = ?1",
            rusqlite::params![file_id],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        debug!("Deleted {} segment(s) for file id {}", rows_affected, file_id);
        Ok(rows_affected)
    }

    fn query(&self, embedding: &[f32], n_results: usize) -> Result<Vec<QueryHit>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document, metadata, embedding FROM memory_segments")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, document, metadata, embedding_bytes) = row?;
            let stored = Self::decode_embedding(&embedding_bytes);
            hits.push(QueryHit {
                id,
                document,
                metadata: serde_json::from_str(&metadata)?,
                distance: Self::squared_l2_distance(embedding, &stored),
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results);
        debug!("Vector query returned {} hit(s).", hits.len());
        Ok(hits)
    }

    /// Returns the total number of segments currently stored.
    fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM memory_segments", [], |row| row.get(0))?;
        debug!("Total segments stored: {}", count);
        Ok(count)
    }
}
