//! Qdrant-backed vector index.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    Distance, FieldType, Filter, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::index::{NaturalKey, QueryResult, StoredDocument, VectorIndex};
use crate::catalog::IndexedDocument;
use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Payload fields indexed for natural-key lookups.
const KEY_FIELDS: [&str; 2] = ["metadata.name", "metadata.slug"];

/// One Qdrant collection holding `{content, metadata}` payloads.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Connect to the configured Qdrant instance.
    ///
    /// `dimension` is used when the collection has to be created.
    pub fn connect(config: &StoreConfig, dimension: usize) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            builder = builder.api_key(key.to_string());
        }
        let client = builder.build()?;
        info!(url = %config.url, collection = %config.index_name, "Connected to Qdrant");
        Ok(Self::with_client(client, &config.index_name, dimension))
    }

    pub fn with_client(client: Qdrant, collection: &str, dimension: usize) -> Self {
        Self {
            client,
            collection: collection.to_string(),
            dimension,
        }
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            return Ok(());
        }

        info!(collection = %self.collection, dimension = self.dimension, "Creating collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await?;

        for field in KEY_FIELDS {
            if let Err(e) = self
                .client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await
            {
                // Counting still works without the index, only slower.
                warn!(field, error = %e, "Failed to create payload index");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.client.collection_exists(&self.collection).await?)
    }

    async fn count_matching(&self, key: &NaturalKey) -> Result<u64> {
        if !self.exists().await? {
            return Err(Error::IndexNotFound(self.collection.clone()));
        }

        let response = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(key_filter(key))
                    .exact(true),
            )
            .await?;
        Ok(response.result.map_or(0, |r| r.count))
    }

    async fn insert(&self, documents: Vec<StoredDocument>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.ensure_collection().await?;

        let count = documents.len();
        let points = documents
            .into_iter()
            .map(to_point)
            .collect::<Result<Vec<_>>>()?;
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;
        debug!(collection = %self.collection, count, "Inserted points");
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        if k == 0 || !self.exists().await? {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await?;
        response.result.into_iter().map(from_scored_point).collect()
    }
}

fn key_filter(key: &NaturalKey) -> Filter {
    let mut conditions = vec![Condition::matches(KEY_FIELDS[0], key.name.clone())];
    if let Some(slug) = &key.slug {
        conditions.push(Condition::matches(KEY_FIELDS[1], slug.clone()));
    }
    Filter::should(conditions)
}

/// Each stored point gets a fresh id; `metadata.id` is payload only.
fn to_point(stored: StoredDocument) -> Result<PointStruct> {
    let id = Uuid::new_v4();
    let payload = Payload::try_from(json!({
        "content": stored.document.content,
        "metadata": stored.document.metadata,
    }))?;
    Ok(PointStruct::new(id.to_string(), stored.embedding, payload))
}

fn from_scored_point(point: ScoredPoint) -> Result<QueryResult> {
    let fields: Map<String, Value> = point
        .payload
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect();
    let document: IndexedDocument = serde_json::from_value(Value::Object(fields))?;
    Ok(QueryResult {
        document,
        score: point.score,
    })
}
