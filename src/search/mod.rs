//! Vector search for catalog documents.
//!
//! Provides embedding generation and similarity search using:
//! - FastEmbed for local embedding generation (ONNX-based, lightweight)
//! - An OpenAI-compatible `/embeddings` endpoint as a remote alternative
//! - Qdrant for vector storage and similarity search
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ IndexedDocument │────▶│     Embedder     │
//! │    (content)    │     │ FastEmbed/OpenAI │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                          ┌──────────────┐      ┌──────────────┐
//!                          │  Embedding   │◀─────│ Query cache  │
//!                          │  [f32; 384]  │      │    (moka)    │
//!                          └──────┬───────┘      └──────────────┘
//!                                 │
//!                                 ▼
//!                      ┌────────────────────┐
//!                      │ VectorStoreGateway │
//!                      └─────────┬──────────┘
//!                                │
//!                    ┌───────────┴───────────┐
//!                    ▼                       ▼
//!              ┌──────────┐           ┌─────────────┐
//!              │  Qdrant  │           │ MemoryIndex │
//!              │  Index   │           │  (tests)    │
//!              └──────────┘           └─────────────┘
//! ```

mod embedding;
mod gateway;
mod index;
mod openai;
mod qdrant;
mod query;

pub use embedding::{
    cosine_similarity, resolve_model, Embedder, Embedding, EmbeddingService,
    EmbeddingServiceConfig, HashEmbedder,
};
pub use gateway::VectorStoreGateway;
pub use index::{MemoryIndex, NaturalKey, QueryResult, StoredDocument, VectorIndex};
pub use openai::OpenAiEmbedder;
pub use qdrant::QdrantIndex;
pub use query::{QueryService, DEFAULT_TOP_K};

/// Default embedding model (all-MiniLM-L6-v2 - 384 dimensions, good balance of speed/quality)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Embedding dimension for the default model
pub const EMBEDDING_DIM: usize = 384;
