//! Record to indexed-document transformation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::record::{FieldText, Record};

/// Structured metadata stored next to each embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub category: String,
    pub industry: String,
    pub short_description: String,
    pub long_description: Option<String>,
    pub key_features: Option<FieldText>,
    pub use_cases: Option<FieldText>,
    pub tags: Option<FieldText>,
    pub logo: Option<String>,
    pub logo_file_name: Option<String>,
    pub image: Option<String>,
    pub image_file_name: Option<String>,
    pub video: Option<String>,
    pub created_by: Option<String>,
    pub website: Option<String>,
    pub access: Option<String>,
    pub pricing_model: Option<String>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub upvoters: Vec<Value>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub featured: bool,
    pub version: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Embeddable text plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Labelled text that gets embedded.
    pub content: String,
    /// Structured fields returned with search hits.
    pub metadata: DocumentMetadata,
}

/// Builds [`IndexedDocument`]s from validated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBuilder;

impl DocumentBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a document, or `None` when a required field is missing or blank.
    pub fn build(&self, record: &Record) -> Option<IndexedDocument> {
        if let Some(field) = record.missing_required_field() {
            warn!(
                field,
                name = record.name.as_deref().unwrap_or(""),
                "Skipping record with missing required field"
            );
            return None;
        }

        let metadata = DocumentMetadata {
            id: record
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: record.name.clone().unwrap_or_default(),
            slug: record.slug.clone(),
            category: record.category.clone().unwrap_or_default(),
            industry: record.industry.clone().unwrap_or_default(),
            short_description: record.short_description.clone().unwrap_or_default(),
            long_description: record.long_description.clone(),
            key_features: record.key_features.clone(),
            use_cases: record.use_cases.clone(),
            tags: record.tags.clone(),
            logo: record.logo.clone(),
            logo_file_name: record.logo_file_name.clone(),
            image: record.image.clone(),
            image_file_name: record.image_file_name.clone(),
            video: record.video.clone(),
            created_by: record.created_by.clone(),
            website: record.website.clone(),
            access: record.access.clone(),
            pricing_model: record.pricing_model.clone(),
            upvotes: record.upvotes.unwrap_or(0),
            upvoters: record.upvoters.clone().unwrap_or_default(),
            approved: record.approved.unwrap_or(false),
            featured: record.featured.unwrap_or(false),
            version: record.version.clone(),
            created_at: Utc::now(),
        };

        Some(IndexedDocument {
            content: render_content(record),
            metadata,
        })
    }
}

fn render_content(record: &Record) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let list = |value: &Option<FieldText>| value.as_ref().map(FieldText::render).unwrap_or_default();

    [
        format!("Name: {}", text(&record.name)),
        format!("Short Description: {}", text(&record.short_description)),
        format!("Long Description: {}", text(&record.long_description)),
        format!("Category: {}", text(&record.category)),
        format!("Industry: {}", text(&record.industry)),
        format!("Key Features: {}", list(&record.key_features)),
        format!("Use Cases: {}", list(&record.use_cases)),
        format!("Tags: {}", list(&record.tags)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Record {
        Record {
            name: Some("Foo".into()),
            category: Some("AI".into()),
            industry: Some("Tools".into()),
            short_description: Some("desc".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_content_has_every_label_in_order() {
        let doc = DocumentBuilder::new().build(&minimal()).unwrap();
        let labels: Vec<&str> = doc
            .content
            .lines()
            .map(|line| line.split(':').next().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Name",
                "Short Description",
                "Long Description",
                "Category",
                "Industry",
                "Key Features",
                "Use Cases",
                "Tags"
            ]
        );
        assert!(doc.content.contains("Long Description: \n"));
        assert!(doc.content.ends_with("Tags: "));
    }

    #[test]
    fn test_optional_fields_rendered() {
        let mut record = minimal();
        record.long_description = Some("A longer text".into());
        record.key_features = Some(FieldText::List(vec!["fast".into(), "cheap".into()]));
        record.use_cases = Some(FieldText::Text("support".into()));
        record.tags = Some(FieldText::List(vec!["ai".into()]));

        let doc = DocumentBuilder::new().build(&record).unwrap();
        assert!(doc.content.contains("Long Description: A longer text"));
        assert!(doc.content.contains("Key Features: fast, cheap"));
        assert!(doc.content.contains("Use Cases: support"));
        assert!(doc.content.contains("Tags: ai"));
    }

    #[test]
    fn test_metadata_defaults() {
        let doc = DocumentBuilder::new().build(&minimal()).unwrap();
        let meta = &doc.metadata;
        assert!(Uuid::parse_str(&meta.id).is_ok());
        assert_eq!(meta.name, "Foo");
        assert_eq!(meta.slug, None);
        assert_eq!(meta.upvotes, 0);
        assert!(meta.upvoters.is_empty());
        assert!(!meta.approved);
        assert!(!meta.featured);
    }

    #[test]
    fn test_metadata_keeps_source_identity() {
        let mut record = minimal();
        record.id = Some("agent-7".into());
        record.slug = Some("foo-agent".into());
        record.upvotes = Some(12);
        record.featured = Some(true);

        let doc = DocumentBuilder::new().build(&record).unwrap();
        assert_eq!(doc.metadata.id, "agent-7");
        assert_eq!(doc.metadata.slug.as_deref(), Some("foo-agent"));
        assert_eq!(doc.metadata.upvotes, 12);
        assert!(doc.metadata.featured);
    }

    #[test]
    fn test_missing_required_field_builds_nothing() {
        let builder = DocumentBuilder::new();
        for field in ["name", "category", "industry", "shortDescription"] {
            let mut value = serde_json::to_value(minimal()).unwrap();
            value[field] = json!("  ");
            let record = Record::from_value(value).unwrap();
            assert!(builder.build(&record).is_none(), "{} blank", field);
        }
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let doc = DocumentBuilder::new().build(&minimal()).unwrap();
        let value = serde_json::to_value(&doc.metadata).unwrap();
        assert_eq!(value["shortDescription"], "desc");
        assert!(value["createdAt"].is_string());
        let back: DocumentMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc.metadata);
    }
}
