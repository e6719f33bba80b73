//! Error types for the catalog indexer.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the ingestion and query pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The backing index has not been created yet.
    ///
    /// Raised by [`crate::search::VectorIndex`] implementations so callers can
    /// tell a missing index apart from a failed lookup.
    #[error("Index '{0}' not found")]
    IndexNotFound(String),

    /// Embedding provider failure.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store read/write failure.
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error reports a missing index.
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, Error::IndexNotFound(_))
    }
}

impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::VectorStore(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Embedding(err.to_string())
    }
}
