pub mod sqlite;
pub use sqlite::SqliteVectorStore;
