use super::*;
use crate::config::{Config, OllamaConfig};
use crate::metadata::SchemaDocument;
use tempfile::TempDir;

/// Deterministic stand-in for the embedding backend.
struct StubEmbedder;

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; 4];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 4] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }
}

fn create_test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ollama: OllamaConfig {
            embedding_dimension: 4,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };
    (config, temp_dir)
}

fn doc(table: &str, content: &str) -> SchemaDocument {
    SchemaDocument {
        table: table.to_string(),
        content: content.to_string(),
    }
}

async fn build_collection(index: &SchemaIndex, kind: CollectionKind, docs: Vec<SchemaDocument>) {
    let embedder = StubEmbedder;
    let embeddings: Vec<Vec<f32>> = docs
        .iter()
        .map(|d| embedder.embed(&d.content).expect("should embed"))
        .collect();
    index
        .rebuild_collection(kind, &docs, &embeddings)
        .await
        .expect("should rebuild collection");
}

#[tokio::test]
async fn retrieval_is_bounded() {
    let (config, _temp_dir) = create_test_config();
    let index = SchemaIndex::open(&config).await.expect("should open index");

    build_collection(
        &index,
        CollectionKind::Tables,
        vec![
            doc("orders", "Table: orders, Description: Customer orders"),
            doc("customers", "Table: customers, Description: Customer data"),
            doc("products", "Table: products, Description: Product catalog"),
        ],
    )
    .await;

    let column_docs: Vec<SchemaDocument> = (0..12)
        .map(|i| doc("orders", &format!("Table: orders, Column: col_{i}")))
        .collect();
    build_collection(&index, CollectionKind::Columns, column_docs).await;

    build_collection(
        &index,
        CollectionKind::SampleQueries,
        (0..5)
            .map(|i| doc("orders", &format!("Table: orders, Sample Query: SELECT {i}")))
            .collect(),
    )
    .await;

    let retriever = SchemaRetriever::new(&index, &StubEmbedder);
    let retrieved = retriever
        .retrieve("total amount of all orders")
        .await
        .expect("should retrieve schema");

    assert!(retrieved.tables.len() <= TABLE_RESULT_COUNT);
    assert!(retrieved.column_docs.len() <= COLUMN_RESULT_COUNT * retrieved.tables.len());
    assert!(retrieved.query_docs.len() <= SAMPLE_QUERY_RESULT_COUNT * retrieved.tables.len());
}

#[tokio::test]
async fn empty_index_yields_empty_schema() {
    let (config, _temp_dir) = create_test_config();
    let index = SchemaIndex::open(&config).await.expect("should open index");

    let retriever = SchemaRetriever::new(&index, &StubEmbedder);
    let retrieved = retriever
        .retrieve("anything at all")
        .await
        .expect("should retrieve from empty index");

    assert!(retrieved.is_empty());
}

#[tokio::test]
async fn hits_without_table_identifier_are_skipped() {
    let (config, _temp_dir) = create_test_config();
    let index = SchemaIndex::open(&config).await.expect("should open index");

    build_collection(
        &index,
        CollectionKind::Tables,
        vec![
            doc("", "malformed document with no identifier"),
            doc("orders", "Table: orders, Description: Customer orders"),
        ],
    )
    .await;

    let retriever = SchemaRetriever::new(&index, &StubEmbedder);
    let retrieved = retriever
        .retrieve("orders")
        .await
        .expect("should retrieve schema");

    assert_eq!(retrieved.tables, vec!["orders".to_string()]);
}

#[tokio::test]
async fn duplicate_table_identifiers_are_preserved() {
    let (config, _temp_dir) = create_test_config();
    let index = SchemaIndex::open(&config).await.expect("should open index");

    build_collection(
        &index,
        CollectionKind::Tables,
        vec![
            doc("orders", "Table: orders, Description: Customer orders"),
            doc("orders", "Table: orders, Description: Customer orders"),
        ],
    )
    .await;
    build_collection(
        &index,
        CollectionKind::Columns,
        vec![
            doc("orders", "Table: orders, Column: id"),
            doc("orders", "Table: orders, Column: amount"),
        ],
    )
    .await;

    let retriever = SchemaRetriever::new(&index, &StubEmbedder);
    let retrieved = retriever
        .retrieve("orders")
        .await
        .expect("should retrieve schema");

    assert_eq!(
        retrieved.tables,
        vec!["orders".to_string(), "orders".to_string()]
    );
    // Column docs accumulate once per matched table, duplicates included
    assert_eq!(retrieved.column_docs.len(), 4);
}
