use crate::config::{MODEL_NAME, MemoryDirs};
use crate::traits::Embedder;
use anyhow::Result;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info};
use std::path::PathBuf;

/// Local text embedding service backed by the FastEmbed all-MiniLM-L6-v2 model.
///
/// The ONNX model is downloaded into the cache directory on first use and
/// loaded once per embedder; build a single instance and share it between
/// the indexer and the searcher.
pub struct LocalEmbedder {
    model: TextEmbedding,
}

impl LocalEmbedder {
    /// Creates a new embedder.
    /// If cache_dir is provided, uses that; otherwise uses the MemoryDirs default.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => MemoryDirs::new().ensure_model_cache_dir()?,
        };

        info!("Loading embedding model ({})...", MODEL_NAME);
        let init_options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_cache_dir(cache_dir);
        let model = TextEmbedding::try_new(init_options)?;

        info!("Initialized embedding model: {}", MODEL_NAME);

        Ok(LocalEmbedder { model })
    }

    /// Creates a new embedder with the default cache directory.
    pub fn new_with_default_model() -> Result<Self> {
        Self::new(None)
    }

    /// Normalizes an embedding vector using L2 normalization.
    pub fn normalize_l2(embedding: &[f32]) -> Vec<f32> {
        let norm = (embedding.iter().map(|x| x * x).sum::<f32>()).sqrt();
        if norm < 1e-5 {
            debug!(
                "Embedding norm {} is less than 1e-5, returning original embedding",
                norm
            );
            embedding.to_vec()
        } else {
            embedding.iter().map(|x| x / norm).collect()
        }
    }
}

impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    /// Embeds a single text string and returns a normalized vector.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.model.embed(vec![text], None)?;
        embeddings
            .into_iter()
            .next()
            .map(|x| Self::normalize_l2(&x))
            .ok_or_else(|| anyhow::anyhow!("Failed to get embedding"))
    }
}
