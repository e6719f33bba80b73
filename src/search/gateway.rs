//! Single entry point to the embedder and the vector index.

use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, info};

use super::embedding::{Embedder, Embedding, EmbeddingService, EmbeddingServiceConfig, HashEmbedder};
use super::index::{MemoryIndex, NaturalKey, QueryResult, StoredDocument, VectorIndex};
use super::openai::OpenAiEmbedder;
use super::qdrant::QdrantIndex;
use crate::catalog::IndexedDocument;
use crate::config::{CatalogConfig, EmbeddingProvider, StoreBackend};
use crate::error::{Error, Result};

/// Query embeddings kept when no capacity is configured.
const DEFAULT_QUERY_CACHE_CAPACITY: u64 = 1_000;

/// Binds one embedder to one logical index for the process lifetime.
///
/// Built once at startup and shared with services through `Arc`.
pub struct VectorStoreGateway {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    query_cache: Cache<String, Arc<Embedding>>,
}

impl VectorStoreGateway {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self::with_query_cache_capacity(embedder, index, DEFAULT_QUERY_CACHE_CAPACITY)
    }

    pub fn with_query_cache_capacity(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        capacity: u64,
    ) -> Self {
        Self {
            embedder,
            index,
            query_cache: Cache::new(capacity),
        }
    }

    /// Build the configured embedder and index.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let embedding = &config.embedding;
        let embedder: Arc<dyn Embedder> = match embedding.provider {
            EmbeddingProvider::FastEmbed => {
                Arc::new(EmbeddingService::with_config(EmbeddingServiceConfig {
                    model_name: embedding.model_name(),
                    batch_size: Some(embedding.batch_size),
                    ..Default::default()
                })?)
            }
            EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::from_config(embedding)?),
            EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(embedding.dimension())),
        };

        let store = &config.store;
        let index: Arc<dyn VectorIndex> = match store.backend {
            StoreBackend::Qdrant => Arc::new(QdrantIndex::connect(store, embedder.dimension())?),
            StoreBackend::Memory => Arc::new(MemoryIndex::new(&store.index_name)),
        };

        info!(
            model = embedder.model(),
            dimension = embedder.dimension(),
            index = index.name(),
            "Vector store gateway ready"
        );
        Ok(Self::with_query_cache_capacity(
            embedder,
            index,
            embedding.query_cache_capacity,
        ))
    }

    /// Name of the bound index.
    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    /// Embed every document's content in one call and write them in bulk.
    /// Returns the number of documents written.
    pub async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&contents).await?;
        if embeddings.len() != documents.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let count = documents.len();
        let stored = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| StoredDocument {
                document,
                embedding,
            })
            .collect();
        self.index.insert(stored).await?;
        debug!(index = self.index.name(), count, "Added documents");
        Ok(count)
    }

    /// Up to `k` documents nearest to `query`, highest score first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<QueryResult>> {
        let vector = self.query_embedding(query).await?;
        let mut results = self.index.nearest(&vector, k).await?;
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    /// Number of indexed documents sharing `key`'s name or slug.
    pub async fn count_matching(&self, key: &NaturalKey) -> Result<u64> {
        self.index.count_matching(key).await
    }

    async fn query_embedding(&self, query: &str) -> Result<Arc<Embedding>> {
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        self.query_cache
            .try_get_with(text.clone(), async move {
                embedder.embed_query(&text).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<Error>| Error::Embedding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DocumentBuilder, Record};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &str {
            self.inner.model()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_documents(texts).await
        }
    }

    fn document(name: &str, description: &str) -> IndexedDocument {
        let record = Record {
            name: Some(name.into()),
            category: Some("AI".into()),
            industry: Some("Tools".into()),
            short_description: Some(description.into()),
            ..Default::default()
        };
        DocumentBuilder::new().build(&record).unwrap()
    }

    fn gateway() -> (VectorStoreGateway, Arc<CountingEmbedder>) {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashEmbedder::new(128),
            calls: AtomicUsize::new(0),
        });
        let gateway = VectorStoreGateway::new(
            embedder.clone(),
            Arc::new(MemoryIndex::new("documents")),
        );
        (gateway, embedder)
    }

    #[tokio::test]
    async fn test_add_embeds_in_one_call() {
        let (gateway, embedder) = gateway();
        let written = gateway
            .add_documents(vec![
                document("Mailer", "email marketing assistant"),
                document("Folder", "protein folding simulation"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        assert_eq!(gateway.add_documents(Vec::new()).await.unwrap(), 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_first() {
        let (gateway, _) = gateway();
        gateway
            .add_documents(vec![
                document("Mailer", "email marketing assistant"),
                document("Folder", "protein folding simulation"),
                document("Writer", "blog post writer"),
            ])
            .await
            .unwrap();

        let results = gateway.search("email marketing", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.metadata.name, "Mailer");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_on_missing_index_is_empty() {
        let (gateway, _) = gateway();
        assert!(gateway.search("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_embeddings_are_cached() {
        let (gateway, embedder) = gateway();
        gateway.search("email", 3).await.unwrap();
        gateway.search("email", 3).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        gateway.search("folding", 3).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_config_memory_backend() {
        let mut config = CatalogConfig::default();
        config.embedding.provider = EmbeddingProvider::Hash;
        config.store.backend = StoreBackend::Memory;
        config.store.index_name = "agents".into();

        let gateway = VectorStoreGateway::from_config(&config).unwrap();
        assert_eq!(gateway.index_name(), "agents");
        assert_eq!(gateway.embedder().dimension(), 384);
    }
}
