//! Vector index abstraction and the in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::embedding::{cosine_similarity, Embedding};
use crate::catalog::{DocumentMetadata, IndexedDocument};
use crate::error::{Error, Result};

/// Identity used to detect already-indexed records: name OR slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey {
    pub name: String,
    /// Ignored when blank.
    pub slug: Option<String>,
}

impl NaturalKey {
    pub fn new(name: impl Into<String>, slug: Option<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.filter(|s| !s.trim().is_empty()),
        }
    }

    /// True when `metadata` shares this key's name or slug.
    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        if metadata.name == self.name {
            return true;
        }
        match (&self.slug, &metadata.slug) {
            (Some(slug), Some(other)) => slug == other,
            _ => false,
        }
    }
}

/// A document together with its embedding, as written to an index.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: IndexedDocument,
    pub embedding: Embedding,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub document: IndexedDocument,
    /// Relevance score; higher is more relevant.
    pub score: f32,
}

/// Storage for embedded documents.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Logical index name.
    fn name(&self) -> &str;

    /// Whether the index has been created.
    async fn exists(&self) -> Result<bool>;

    /// Count documents matching `key`.
    ///
    /// Fails with [`Error::IndexNotFound`] when the index does not exist yet.
    async fn count_matching(&self, key: &NaturalKey) -> Result<u64>;

    /// Append documents, creating the index when needed.
    /// Every document is stored as a new entry; nothing is overwritten.
    async fn insert(&self, documents: Vec<StoredDocument>) -> Result<()>;

    /// Up to `k` documents nearest to `vector`, most relevant first.
    /// A missing index yields no results.
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>>;
}

/// Process-local index scored by cosine similarity.
///
/// The index is absent until the first write, mirroring a remote collection
/// that is created lazily.
#[derive(Debug)]
pub struct MemoryIndex {
    name: String,
    documents: RwLock<Option<Vec<StoredDocument>>>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(None),
        }
    }

    /// Number of stored documents (0 when absent).
    pub async fn len(&self) -> usize {
        self.documents.read().await.as_ref().map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.documents.read().await.is_some())
    }

    async fn count_matching(&self, key: &NaturalKey) -> Result<u64> {
        let guard = self.documents.read().await;
        let documents = guard
            .as_ref()
            .ok_or_else(|| Error::IndexNotFound(self.name.clone()))?;
        Ok(documents
            .iter()
            .filter(|stored| key.matches(&stored.document.metadata))
            .count() as u64)
    }

    async fn insert(&self, documents: Vec<StoredDocument>) -> Result<()> {
        let mut guard = self.documents.write().await;
        let stored = guard.get_or_insert_with(Vec::new);
        let count = documents.len();
        stored.extend(documents);
        debug!(index = %self.name, count, total = stored.len(), "Inserted documents");
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        let guard = self.documents.read().await;
        let Some(documents) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<QueryResult> = documents
            .iter()
            .map(|stored| QueryResult {
                document: stored.document.clone(),
                score: cosine_similarity(vector, &stored.embedding),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DocumentBuilder, Record};

    fn stored(id: &str, name: &str, slug: Option<&str>, embedding: Embedding) -> StoredDocument {
        let record = Record {
            id: Some(id.into()),
            name: Some(name.into()),
            slug: slug.map(String::from),
            category: Some("AI".into()),
            industry: Some("Tools".into()),
            short_description: Some("desc".into()),
            ..Default::default()
        };
        StoredDocument {
            document: DocumentBuilder::new().build(&record).unwrap(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_absent_until_first_write() {
        let index = MemoryIndex::new("documents");
        assert!(!index.exists().await.unwrap());
        let err = index
            .count_matching(&NaturalKey::new("Foo", None))
            .await
            .unwrap_err();
        assert!(err.is_index_not_found());
        assert!(index.nearest(&[1.0, 0.0], 5).await.unwrap().is_empty());

        index
            .insert(vec![stored("1", "Foo", None, vec![1.0, 0.0])])
            .await
            .unwrap();
        assert!(index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_count_matches_name_or_slug() {
        let index = MemoryIndex::new("documents");
        index
            .insert(vec![
                stored("1", "Foo", Some("foo"), vec![1.0, 0.0]),
                stored("2", "Bar", Some("bar"), vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let by_name = NaturalKey::new("Foo", Some("other".into()));
        assert_eq!(index.count_matching(&by_name).await.unwrap(), 1);

        let by_slug = NaturalKey::new("Renamed", Some("bar".into()));
        assert_eq!(index.count_matching(&by_slug).await.unwrap(), 1);

        let neither = NaturalKey::new("Baz", Some("baz".into()));
        assert_eq!(index.count_matching(&neither).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_slug_never_matches() {
        let index = MemoryIndex::new("documents");
        index
            .insert(vec![stored("1", "Foo", Some(" "), vec![1.0])])
            .await
            .unwrap();
        let key = NaturalKey::new("Other", Some(" ".into()));
        assert_eq!(key.slug, None);
        assert_eq!(index.count_matching(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shared_id_keeps_both_documents() {
        let index = MemoryIndex::new("documents");
        index
            .insert(vec![stored("1", "Foo", None, vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .insert(vec![stored("1", "Foo v2", None, vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(index.len().await, 2);
        let hits = index.nearest(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].document.metadata.name, "Foo");
        assert_eq!(hits[1].document.metadata.name, "Foo v2");
        assert!(hits.iter().all(|h| h.document.metadata.id == "1"));
    }

    #[tokio::test]
    async fn test_nearest_sorted_and_bounded() {
        let index = MemoryIndex::new("documents");
        index
            .insert(vec![
                stored("1", "A", None, vec![1.0, 0.0]),
                stored("2", "B", None, vec![0.7, 0.7]),
                stored("3", "C", None, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = index.nearest(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.metadata.name, "A");
        assert_eq!(hits[1].document.metadata.name, "B");
        assert!(hits[0].score >= hits[1].score);
    }
}
