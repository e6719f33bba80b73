//! AgentMesh catalog indexer.
//!
//! Ingests agent/tool records into a vector index and answers similarity
//! queries over them.
//!
//! - [`catalog`]: record validation, duplicate detection and batch ingestion
//! - [`search`]: embedders, vector indexes, the gateway and query service
//! - [`text`]: normalization and chunking for embedding
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentmesh_catalog::{
//!     HashEmbedder, IngestService, MemoryIndex, QueryService, VectorStoreGateway,
//! };
//!
//! # async fn run() -> agentmesh_catalog::Result<()> {
//! let gateway = Arc::new(VectorStoreGateway::new(
//!     Arc::new(HashEmbedder::default()),
//!     Arc::new(MemoryIndex::new("documents")),
//! ));
//! let ingest = IngestService::new(Arc::clone(&gateway));
//! let report = ingest
//!     .ingest_json(vec![serde_json::json!({
//!         "name": "Foo",
//!         "category": "AI",
//!         "industry": "Tools",
//!         "shortDescription": "desc"
//!     })])
//!     .await?;
//! assert_eq!(report.accepted_count, 1);
//!
//! let hits = QueryService::new(gateway).similarity_search("foo", 5).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod search;
pub mod text;

pub use catalog::{
    records_from_payload, DocumentBuilder, DocumentMetadata, DuplicateGuard, IndexedDocument,
    IngestReport, IngestService, Record,
};
pub use config::{CatalogConfig, EmbeddingConfig, EmbeddingProvider, StoreBackend, StoreConfig, TextConfig};
pub use error::{Error, Result};
pub use search::{
    Embedder, EmbeddingService, HashEmbedder, MemoryIndex, OpenAiEmbedder, QdrantIndex,
    QueryResult, QueryService, VectorIndex, VectorStoreGateway, DEFAULT_TOP_K,
};
pub use text::{Chunk, ChunkStrategy, Language, TextPreprocessor};
