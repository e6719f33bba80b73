//! Duplicate detection against already-indexed documents.

use std::sync::Arc;
use tracing::{debug, info};

use super::record::Record;
use crate::error::{Error, Result};
use crate::search::{NaturalKey, VectorStoreGateway};

/// Checks whether a record's name or slug is already indexed.
///
/// Only documents already written are visible; two records with the same key
/// in one batch both pass.
#[derive(Clone)]
pub struct DuplicateGuard {
    gateway: Arc<VectorStoreGateway>,
}

impl DuplicateGuard {
    pub fn new(gateway: Arc<VectorStoreGateway>) -> Self {
        Self { gateway }
    }

    /// True when an indexed document has the record's name, or its slug
    /// when the slug is non-blank.
    ///
    /// A missing index means nothing is indexed yet and yields `false`.
    pub async fn is_duplicate(&self, record: &Record) -> Result<bool> {
        let Some(key) = natural_key(record) else {
            return Err(Error::InvalidInput(
                "record has no name to check for duplicates".to_string(),
            ));
        };

        match self.gateway.count_matching(&key).await {
            Ok(count) => {
                debug!(name = %key.name, count, "Duplicate lookup");
                Ok(count > 0)
            }
            Err(e) if e.is_index_not_found() => {
                info!(
                    index = self.gateway.index_name(),
                    "Index does not exist yet, treating record as new"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Natural key of a record, or `None` without a usable name.
pub fn natural_key(record: &Record) -> Option<NaturalKey> {
    let name = super::record::non_blank(&record.name)?;
    Some(NaturalKey::new(
        name,
        record.slug_key().map(str::to_string),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DocumentBuilder;
    use crate::search::{HashEmbedder, MemoryIndex, QueryResult, StoredDocument, VectorIndex};
    use async_trait::async_trait;

    fn record(name: &str, slug: Option<&str>) -> Record {
        Record {
            name: Some(name.into()),
            slug: slug.map(String::from),
            category: Some("AI".into()),
            industry: Some("Tools".into()),
            short_description: Some("desc".into()),
            ..Default::default()
        }
    }

    fn gateway_with(index: Arc<dyn VectorIndex>) -> Arc<VectorStoreGateway> {
        Arc::new(VectorStoreGateway::new(Arc::new(HashEmbedder::new(32)), index))
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        fn name(&self) -> &str {
            "failing"
        }

        async fn exists(&self) -> Result<bool> {
            Ok(true)
        }

        async fn count_matching(&self, _key: &NaturalKey) -> Result<u64> {
            Err(Error::VectorStore("connection refused".to_string()))
        }

        async fn insert(&self, _documents: Vec<StoredDocument>) -> Result<()> {
            Ok(())
        }

        async fn nearest(&self, _vector: &[f32], _k: usize) -> Result<Vec<QueryResult>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_not_duplicate() {
        let guard = DuplicateGuard::new(gateway_with(Arc::new(MemoryIndex::new("documents"))));
        assert!(!guard.is_duplicate(&record("Foo", None)).await.unwrap());
    }

    #[tokio::test]
    async fn test_matches_by_name_or_slug() {
        let gateway = gateway_with(Arc::new(MemoryIndex::new("documents")));
        let doc = DocumentBuilder::new()
            .build(&record("Foo", Some("foo")))
            .unwrap();
        gateway.add_documents(vec![doc]).await.unwrap();

        let guard = DuplicateGuard::new(gateway);
        assert!(guard.is_duplicate(&record("Foo", None)).await.unwrap());
        assert!(guard.is_duplicate(&record("Other", Some("foo"))).await.unwrap());
        assert!(!guard.is_duplicate(&record("Other", Some("bar"))).await.unwrap());
        assert!(!guard.is_duplicate(&record("Other", Some(""))).await.unwrap());
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let guard = DuplicateGuard::new(gateway_with(Arc::new(FailingIndex)));
        let err = guard.is_duplicate(&record("Foo", None)).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[test]
    fn test_natural_key_requires_name() {
        assert!(natural_key(&Record::default()).is_none());
        let key = natural_key(&record("Foo", Some("  "))).unwrap();
        assert_eq!(key.name, "Foo");
        assert_eq!(key.slug, None);
    }
}
