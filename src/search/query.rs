//! Similarity queries over the catalog.

use std::sync::Arc;
use tracing::debug;

use super::gateway::VectorStoreGateway;
use super::index::QueryResult;
use crate::error::{Error, Result};

/// Number of results returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 5;

/// Validated similarity search over the gateway's index.
#[derive(Clone)]
pub struct QueryService {
    gateway: Arc<VectorStoreGateway>,
}

impl QueryService {
    pub fn new(gateway: Arc<VectorStoreGateway>) -> Self {
        Self { gateway }
    }

    /// Up to `k` documents most similar to `query`, highest score first.
    ///
    /// A blank query or `k == 0` is rejected before the gateway is touched.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<QueryResult>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        if k == 0 {
            return Err(Error::InvalidInput("k must be at least 1".to_string()));
        }

        let results = self.gateway.search(query, k).await?;
        debug!(k, hits = results.len(), "Similarity search finished");
        Ok(results)
    }
}
