//! Batch ingestion: validate, deduplicate, embed, write.

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::dedup::DuplicateGuard;
use super::document::{DocumentBuilder, IndexedDocument};
use super::record::Record;
use crate::error::{Error, Result};
use crate::search::VectorStoreGateway;

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Documents written to the index.
    pub accepted_count: usize,
    /// Items in the incoming batch, whatever happened to them.
    pub total_received_count: usize,
}

/// Sequential ingestion pipeline over one gateway.
#[derive(Clone)]
pub struct IngestService {
    builder: DocumentBuilder,
    guard: DuplicateGuard,
    gateway: Arc<VectorStoreGateway>,
}

impl IngestService {
    pub fn new(gateway: Arc<VectorStoreGateway>) -> Self {
        Self {
            builder: DocumentBuilder::new(),
            guard: DuplicateGuard::new(Arc::clone(&gateway)),
            gateway,
        }
    }

    /// Ingest parsed records.
    ///
    /// Invalid and duplicate records are skipped with a warning; a failed
    /// duplicate lookup skips that record only. Survivors are written in a
    /// single bulk call whose failure is returned to the caller.
    pub async fn ingest(&self, records: Vec<Record>) -> Result<IngestReport> {
        let total = records.len();
        counter!("catalog_records_received_total").increment(total as u64);

        let mut accepted = Vec::new();
        for record in &records {
            if let Some(document) = self.process(record).await {
                accepted.push(document);
            }
        }
        self.write(accepted, total).await
    }

    /// Ingest raw JSON items; an item that is not a valid record object is
    /// logged and skipped but still counted as received.
    pub async fn ingest_json(&self, items: Vec<Value>) -> Result<IngestReport> {
        let total = items.len();
        counter!("catalog_records_received_total").increment(total as u64);

        let mut accepted = Vec::new();
        for (position, item) in items.into_iter().enumerate() {
            let record = match Record::from_value(item) {
                Ok(record) => record,
                Err(e) => {
                    error!(position, error = %e, "Failed to parse record");
                    reject("parse");
                    continue;
                }
            };
            if let Some(document) = self.process(&record).await {
                accepted.push(document);
            }
        }
        self.write(accepted, total).await
    }

    async fn process(&self, record: &Record) -> Option<IndexedDocument> {
        let document = match self.builder.build(record) {
            Some(document) => document,
            None => {
                reject("invalid");
                return None;
            }
        };

        match self.guard.is_duplicate(record).await {
            Ok(false) => Some(document),
            Ok(true) => {
                warn!(
                    name = %document.metadata.name,
                    slug = document.metadata.slug.as_deref().unwrap_or(""),
                    "Skipping duplicate record"
                );
                reject("duplicate");
                None
            }
            Err(e) => {
                error!(name = %document.metadata.name, error = %e, "Duplicate check failed");
                reject("lookup_error");
                None
            }
        }
    }

    async fn write(&self, documents: Vec<IndexedDocument>, total: usize) -> Result<IngestReport> {
        let accepted_count = if documents.is_empty() {
            0
        } else {
            self.gateway.add_documents(documents).await?
        };
        counter!("catalog_records_accepted_total").increment(accepted_count as u64);
        info!(
            accepted = accepted_count,
            received = total,
            index = self.gateway.index_name(),
            "Ingestion finished"
        );
        Ok(IngestReport {
            accepted_count,
            total_received_count: total,
        })
    }
}

fn reject(reason: &'static str) {
    counter!("catalog_records_rejected_total", "reason" => reason).increment(1);
}

/// Extract record items from an upload payload.
///
/// Accepts a bare array, `{"data": [...]}`, or the transport envelope
/// `{"data": [{"json": {"data": [...]}}]}`. An empty item list is rejected.
pub fn records_from_payload(payload: &Value) -> Result<Vec<Value>> {
    let items = match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(data)) => {
                let envelope = data.first().and_then(|first| first.pointer("/json/data"));
                match envelope {
                    Some(Value::Array(inner)) => Some(inner),
                    Some(_) => None,
                    None => Some(data),
                }
            }
            _ => None,
        },
        _ => None,
    };
    let items = items.ok_or_else(|| {
        Error::InvalidInput("payload does not contain a list of records".to_string())
    })?;

    if items.is_empty() {
        return Err(Error::InvalidInput("no records received".to_string()));
    }
    Ok(items.clone())
}
