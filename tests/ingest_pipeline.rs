//! End-to-end ingestion and query over the in-memory index.

use std::sync::Arc;

use agentmesh_catalog::{
    Error, HashEmbedder, IngestReport, IngestService, MemoryIndex, QueryService, Record,
    TextConfig, TextPreprocessor, VectorIndex, VectorStoreGateway,
};
use serde_json::{json, Value};

struct Harness {
    index: Arc<MemoryIndex>,
    ingest: IngestService,
    query: QueryService,
}

fn harness() -> Harness {
    let index = Arc::new(MemoryIndex::new("documents"));
    let gateway = Arc::new(VectorStoreGateway::new(
        Arc::new(HashEmbedder::default()),
        index.clone(),
    ));
    Harness {
        index,
        ingest: IngestService::new(Arc::clone(&gateway)),
        query: QueryService::new(gateway),
    }
}

fn record(name: &str, slug: &str, description: &str) -> Value {
    json!({
        "name": name,
        "slug": slug,
        "category": "AI",
        "industry": "Tools",
        "shortDescription": description
    })
}

fn report(accepted: usize, total: usize) -> IngestReport {
    IngestReport {
        accepted_count: accepted,
        total_received_count: total,
    }
}

#[tokio::test]
async fn test_first_ingest_accepts_second_rejects() {
    let h = harness();
    let foo = json!({"name": "Foo", "category": "AI", "industry": "Tools", "shortDescription": "desc"});

    assert_eq!(h.ingest.ingest_json(vec![foo.clone()]).await.unwrap(), report(1, 1));
    assert_eq!(h.ingest.ingest_json(vec![foo]).await.unwrap(), report(0, 1));
    assert_eq!(h.index.len().await, 1);
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let h = harness();
    let blank = json!({"name": "", "category": "AI", "industry": "Tools", "shortDescription": "desc"});

    assert_eq!(h.ingest.ingest_json(vec![blank]).await.unwrap(), report(0, 1));
    assert!(!h.index.exists().await.unwrap());
}

#[tokio::test]
async fn test_each_required_field_is_enforced() {
    let h = harness();
    let items: Vec<Value> = ["name", "category", "industry", "shortDescription"]
        .iter()
        .map(|field| {
            let mut item = record("Foo", "foo", "desc");
            item.as_object_mut().unwrap().remove(*field);
            item
        })
        .collect();

    assert_eq!(h.ingest.ingest_json(items).await.unwrap(), report(0, 4));
}

#[tokio::test]
async fn test_same_batch_duplicates_are_both_accepted() {
    let h = harness();
    let items = vec![
        record("Foo", "foo", "first copy"),
        record("Foo", "foo", "second copy"),
    ];

    assert_eq!(h.ingest.ingest_json(items).await.unwrap(), report(2, 2));
    assert_eq!(h.index.len().await, 2);
}

#[tokio::test]
async fn test_reused_id_does_not_overwrite() {
    let h = harness();
    let mut alpha = record("Alpha", "alpha", "first tool");
    alpha["id"] = json!("7");
    let mut beta = record("Beta", "beta", "second tool");
    beta["id"] = json!("7");

    assert_eq!(h.ingest.ingest_json(vec![alpha]).await.unwrap(), report(1, 1));
    assert_eq!(h.ingest.ingest_json(vec![beta]).await.unwrap(), report(1, 1));
    assert_eq!(h.index.len().await, 2);

    let mut names: Vec<String> = h
        .query
        .similarity_search("tool", 10)
        .await
        .unwrap()
        .into_iter()
        .map(|hit| hit.document.metadata.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn test_same_batch_shared_id_writes_both() {
    let h = harness();
    let mut first = record("Foo", "foo", "desc");
    first["id"] = json!("9");
    let second = first.clone();

    assert_eq!(
        h.ingest.ingest_json(vec![first, second]).await.unwrap(),
        report(2, 2)
    );
    assert_eq!(h.index.len().await, 2);
}

#[tokio::test]
async fn test_slug_match_is_a_duplicate() {
    let h = harness();
    h.ingest
        .ingest_json(vec![record("Foo", "foo", "desc")])
        .await
        .unwrap();

    let renamed = record("Foo Renamed", "foo", "desc");
    let fresh = record("Bar", "bar", "desc");
    assert_eq!(
        h.ingest.ingest_json(vec![renamed, fresh]).await.unwrap(),
        report(1, 2)
    );
}

#[tokio::test]
async fn test_mixed_batch_counts() {
    let h = harness();
    let items = vec![
        record("Alpha", "alpha", "desc"),
        json!({"name": "Missing fields"}),
        json!(42),
        record("Beta", "beta", "desc"),
    ];

    assert_eq!(h.ingest.ingest_json(items).await.unwrap(), report(2, 4));
}

#[tokio::test]
async fn test_indexed_content_and_metadata() {
    let h = harness();
    let item = json!({
        "id": "agent-1",
        "name": "Mailer",
        "slug": "mailer",
        "category": "Marketing",
        "industry": "Retail",
        "shortDescription": "email campaigns",
        "longDescription": "Plans and sends email campaigns",
        "keyFeatures": ["scheduling", "templates"],
        "useCases": "newsletters",
        "tags": ["email", "marketing"],
        "upvotes": 3
    });
    h.ingest.ingest_json(vec![item]).await.unwrap();

    let hits = h.query.similarity_search("email campaigns", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    let document = &hits[0].document;
    assert!(document.content.contains("Long Description: Plans and sends email campaigns"));
    assert!(document.content.contains("Key Features: scheduling, templates"));
    assert!(document.content.contains("Use Cases: newsletters"));
    assert!(document.content.contains("Tags: email, marketing"));
    assert_eq!(document.metadata.id, "agent-1");
    assert_eq!(document.metadata.name, "Mailer");
    assert_eq!(document.metadata.slug.as_deref(), Some("mailer"));
    assert_eq!(document.metadata.upvotes, 3);
    assert!(!document.metadata.approved);
}

#[tokio::test]
async fn test_query_results_bounded_and_sorted() {
    let h = harness();
    let items = vec![
        record("Mailer", "mailer", "email marketing assistant"),
        record("Folder", "folder", "protein folding simulation"),
        record("Writer", "writer", "blog post writer"),
        record("Scheduler", "scheduler", "meeting scheduling assistant"),
    ];
    h.ingest.ingest_json(items).await.unwrap();

    for k in [1, 2, 3, 10] {
        let hits = h.query.similarity_search("email assistant", k).await.unwrap();
        assert!(hits.len() <= k);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
    let hits = h.query.similarity_search("email assistant", 10).await.unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].document.metadata.name, "Mailer");
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let h = harness();
    h.ingest
        .ingest_json(vec![record("Foo", "foo", "desc")])
        .await
        .unwrap();

    let err = h.query.similarity_search("", 5).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_typed_records_ingest() {
    let h = harness();
    let record = Record {
        name: Some("Typed".into()),
        category: Some("AI".into()),
        industry: Some("Tools".into()),
        short_description: Some("desc".into()),
        ..Default::default()
    };
    assert_eq!(
        h.ingest.ingest(vec![record.clone(), Record::default()]).await.unwrap(),
        report(1, 2)
    );
    assert_eq!(h.ingest.ingest(vec![record]).await.unwrap(), report(0, 1));
}

#[test]
fn test_recursive_chunks_bounded_with_overlap() {
    let config = TextConfig::default();
    let preprocessor = TextPreprocessor::new(&config).unwrap();
    let text: String = (0..500).map(|i| format!("w{:03} ", i)).collect();
    assert_eq!(text.chars().count(), 2500);

    let chunks = preprocessor.raw_chunks(&text);
    assert!(chunks.len() >= 3);
    for chunk in &chunks {
        assert!(chunk.char_len() <= 1000);
    }
    for pair in chunks.windows(2) {
        let (prev, next) = (&pair[0].text, &pair[1].text);
        let first_word = next.split(' ').next().unwrap();
        let start = prev.find(first_word).expect("next chunk starts inside previous");
        let shared = prev.chars().count() - prev[..start].chars().count();
        assert!(shared > 0 && shared <= 200);
        assert!(next.starts_with(&prev[start..]));
    }
}
