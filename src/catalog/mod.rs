//! Catalog ingestion.
//!
//! Turns incoming agent/tool records into indexed documents:
//!
//! ```text
//! Record ──▶ DocumentBuilder ──▶ DuplicateGuard ──▶ VectorStoreGateway
//!            (validate, render)   (name OR slug)     (embed, bulk write)
//! ```
//!
//! Records in one batch are processed strictly in order. The guard only sees
//! documents written by earlier calls.

mod dedup;
mod document;
mod ingest;
mod record;

pub use dedup::{natural_key, DuplicateGuard};
pub use document::{DocumentBuilder, DocumentMetadata, IndexedDocument};
pub use ingest::{records_from_payload, IngestReport, IngestService};
pub use record::{FieldText, Record, REQUIRED_FIELDS};
