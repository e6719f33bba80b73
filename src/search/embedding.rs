//! Embedding generation.
//!
//! [`Embedder`] is the seam between the pipeline and whatever produces
//! vectors. [`EmbeddingService`] runs a local ONNX model through FastEmbed;
//! [`HashEmbedder`] hashes tokens into a fixed-size vector and needs no model,
//! which makes it the choice for offline runs and tests.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{DEFAULT_MODEL, EMBEDDING_DIM};
use crate::error::{Error, Result};

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Produces embeddings for documents and queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier.
    fn model(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a batch of document texts, preserving order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Embedder returned no vector for query".to_string()))
    }
}

/// Configuration for the FastEmbed-backed service.
#[derive(Debug, Clone)]
pub struct EmbeddingServiceConfig {
    /// Model name (see [`resolve_model`]).
    pub model_name: String,
    /// Where downloaded model files are cached.
    pub cache_dir: Option<PathBuf>,
    /// Print download progress on first use.
    pub show_download_progress: bool,
    /// Inference batch size; FastEmbed default when unset.
    pub batch_size: Option<usize>,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            cache_dir: None,
            show_download_progress: false,
            batch_size: None,
        }
    }
}

/// Local embedding service (FastEmbed / ONNX runtime).
pub struct EmbeddingService {
    model: Arc<TextEmbedding>,
    config: EmbeddingServiceConfig,
    dimension: usize,
}

impl EmbeddingService {
    /// Create a service with the default model (downloads ~90MB on first use).
    pub fn new() -> Result<Self> {
        Self::with_config(EmbeddingServiceConfig::default())
    }

    /// Create a service with explicit configuration.
    pub fn with_config(config: EmbeddingServiceConfig) -> Result<Self> {
        let (model, dimension) = resolve_model(&config.model_name)?;
        let mut options =
            InitOptions::new(model).with_show_download_progress(config.show_download_progress);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        info!(model = %config.model_name, "Loading embedding model");
        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            Error::Embedding(format!(
                "Failed to load model '{}': {}",
                config.model_name, e
            ))
        })?;

        Ok(Self {
            model: Arc::new(embedding),
            config,
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    fn model(&self) -> &str {
        &self.config.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = Arc::clone(&self.model);
        let inputs = texts.to_vec();
        let batch_size = self.config.batch_size;
        debug!(count = inputs.len(), "Embedding documents");

        tokio::task::spawn_blocking(move || model.embed(inputs, batch_size))
            .await
            .map_err(|e| Error::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

/// Map a model name onto a FastEmbed model and its dimension.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let normalized = name
        .trim()
        .trim_start_matches("sentence-transformers/")
        .trim_start_matches("BAAI/")
        .trim_start_matches("intfloat/")
        .to_ascii_lowercase();
    match normalized.as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, EMBEDDING_DIM)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "multilingual-e5-small" => Ok((EmbeddingModel::MultilingualE5Small, 384)),
        "paraphrase-multilingual-minilm-l12-v2" => {
            Ok((EmbeddingModel::ParaphraseMLMiniLML12V2, 384))
        }
        _ => Err(Error::Config(format!(
            "Unsupported local embedding model '{}'",
            name
        ))),
    }
}

/// Deterministic feature-hashing embedder.
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one bucket with a
/// hash-derived sign, and the result is L2-normalized. Texts sharing words get
/// positive cosine similarity; identical texts get identical vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model: String,
}

impl HashEmbedder {
    /// Create a hashing embedder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model: format!("hash-{}", dimension),
        }
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two equal-length vectors.
/// Returns 0.0 when either vector has zero norm or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}
