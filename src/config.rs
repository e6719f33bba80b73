//! Catalog configuration.
//!
//! Loaded from a TOML file (see `agentmesh-catalog init`) and then patched
//! with environment overrides, so credentials never have to live on disk.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::text::Language;

/// Default logical index name.
pub const DEFAULT_INDEX_NAME: &str = "documents";

/// Default Qdrant gRPC endpoint.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,
    /// Vector index settings.
    pub store: StoreConfig,
    /// Text preparation settings.
    pub text: TextConfig,
}

/// Which embedding backend produces vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX model through fastembed.
    #[default]
    FastEmbed,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
    /// Deterministic token hashing, no model download.
    Hash,
}

impl EmbeddingProvider {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingProvider::FastEmbed => "all-MiniLM-L6-v2",
            EmbeddingProvider::OpenAi => "text-embedding-3-small",
            EmbeddingProvider::Hash => "hash-384",
        }
    }

    /// Vector dimension when none is configured.
    pub fn default_dimension(&self) -> usize {
        match self {
            EmbeddingProvider::FastEmbed => 384,
            EmbeddingProvider::OpenAi => 1536,
            EmbeddingProvider::Hash => 384,
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastembed" => Ok(EmbeddingProvider::FastEmbed),
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "hash" => Ok(EmbeddingProvider::Hash),
            other => Err(Error::Config(format!(
                "Unsupported embedding provider '{}'",
                other
            ))),
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selection.
    pub provider: EmbeddingProvider,
    /// Model identifier; provider default when unset.
    pub model: Option<String>,
    /// Vector dimension; provider default when unset.
    pub dimension: Option<usize>,
    /// API key for remote providers.
    pub api_key: Option<String>,
    /// Base URL for OpenAI-compatible providers.
    pub base_url: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per remote request (including the first).
    pub max_retries: usize,
    /// Maximum inputs per remote request.
    pub batch_size: usize,
    /// Number of query embeddings kept in memory.
    pub query_cache_capacity: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: None,
            dimension: None,
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            batch_size: 64,
            query_cache_capacity: 1_000,
        }
    }
}

impl EmbeddingConfig {
    /// Effective model name.
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Effective vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
            .unwrap_or_else(|| self.provider.default_dimension())
    }
}

/// Which index implementation stores documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Qdrant collection.
    #[default]
    Qdrant,
    /// Process-local index, lost on exit.
    Memory,
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: StoreBackend,
    /// Index endpoint address.
    pub url: String,
    /// API key for the index endpoint.
    pub api_key: Option<String>,
    /// Logical index (collection) name.
    pub index_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: DEFAULT_QDRANT_URL.to_string(),
            api_key: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
        }
    }
}

/// Text preparation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Language for stop words and stemming.
    pub language: Language,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Minimum block length before a paragraph break is inserted.
    pub reflow_threshold: usize,
    /// Distance percentile that marks a semantic breakpoint.
    pub semantic_percentile: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            chunk_size: 1000,
            chunk_overlap: 200,
            reflow_threshold: 500,
            semantic_percentile: 95.0,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("CATALOG_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Some(model) = get("CATALOG_EMBEDDING_MODEL") {
            self.embedding.model = Some(model);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.embedding.base_url = url;
        }
        if let Some(url) = get("QDRANT_URL") {
            self.store.url = url;
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Some(index) = get("CATALOG_INDEX") {
            self.store.index_name = index;
        }
        if let Some(language) = get("CATALOG_LANGUAGE") {
            self.text.language = language.parse()?;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.store.index_name.trim().is_empty() {
            return Err(Error::Config("index_name must not be empty".to_string()));
        }
        if self.embedding.dimension() == 0 {
            return Err(Error::Config(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        if self.text.chunk_size == 0 {
            return Err(Error::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.text.chunk_overlap >= self.text.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.text.chunk_overlap, self.text.chunk_size
            )));
        }
        if !(0.0..=100.0).contains(&self.text.semantic_percentile) {
            return Err(Error::Config(format!(
                "semantic_percentile must be within 0..=100, got {}",
                self.text.semantic_percentile
            )));
        }
        Ok(())
    }
}
