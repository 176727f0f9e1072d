use super::*;
use tempfile::TempDir;

const SAMPLE_BUNDLE: &str = r#"
[[tables]]
name = "orders"
description = "Customer orders with totals"

[[tables]]
name = "customers"
description = "Customer master data"

[[columns]]
table = "orders"
column = "id"
data_type = "INT"
primary_key = true
description = "Order identifier"

[[columns]]
table = "orders"
column = "amount"
data_type = "DECIMAL(10,2)"

[[columns]]
table = "orders"
column = "customer_id"
data_type = "INT"
foreign_key = "customers.id"

[[sample_queries]]
table = "orders"
sql = "SELECT SUM(amount) FROM orders"
"#;

#[test]
fn load_sample_bundle() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("schema.toml");
    std::fs::write(&path, SAMPLE_BUNDLE).expect("should write bundle");

    let metadata = SchemaMetadata::load(&path).expect("should load bundle");
    assert_eq!(metadata.tables.len(), 2);
    assert_eq!(metadata.columns.len(), 3);
    assert_eq!(metadata.sample_queries.len(), 1);
}

#[test]
fn load_missing_file_is_fatal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let result = SchemaMetadata::load(temp_dir.path().join("nope.toml"));
    assert!(result.is_err());
}

#[test]
fn load_rejects_empty_table_name() {
    let bundle = r#"
[[tables]]
name = ""
description = "nameless"
"#;
    let metadata: SchemaMetadata = toml::from_str(bundle).expect("should parse toml");
    assert!(metadata.validate().is_err());
}

#[test]
fn load_rejects_empty_sample_sql() {
    let bundle = r#"
[[sample_queries]]
table = "orders"
sql = "   "
"#;
    let metadata: SchemaMetadata = toml::from_str(bundle).expect("should parse toml");
    assert!(metadata.validate().is_err());
}

#[test]
fn rendering_is_deterministic() {
    let record = ColumnRecord {
        table: "orders".to_string(),
        column: "amount".to_string(),
        data_type: "DECIMAL(10,2)".to_string(),
        primary_key: false,
        foreign_key: None,
        description: Some("Order total".to_string()),
    };

    let first = render_column(&record);
    let second = render_column(&record);
    assert_eq!(first, second);
}

#[test]
fn table_rendering() {
    let record = TableRecord {
        name: "orders".to_string(),
        description: "Customer orders with totals".to_string(),
    };

    let doc = render_table(&record);
    assert_eq!(doc.table, "orders");
    assert_eq!(
        doc.content,
        "Table: orders, Description: Customer orders with totals"
    );
}

#[test]
fn column_rendering_fills_placeholders() {
    let record = ColumnRecord {
        table: "orders".to_string(),
        column: "amount".to_string(),
        data_type: "DECIMAL(10,2)".to_string(),
        primary_key: false,
        foreign_key: None,
        description: None,
    };

    let doc = render_column(&record);
    assert_eq!(
        doc.content,
        "Table: orders, Column: amount, Data Type: DECIMAL(10,2), \
         Primary Key: No, Foreign Key: None, Description: No Info"
    );
}

#[test]
fn column_rendering_with_keys() {
    let record = ColumnRecord {
        table: "orders".to_string(),
        column: "customer_id".to_string(),
        data_type: "INT".to_string(),
        primary_key: true,
        foreign_key: Some("customers.id".to_string()),
        description: Some("Owning customer".to_string()),
    };

    let doc = render_column(&record);
    assert_eq!(
        doc.content,
        "Table: orders, Column: customer_id, Data Type: INT, \
         Primary Key: Yes, Foreign Key: customers.id, Description: Owning customer"
    );
}

#[test]
fn sample_query_rendering() {
    let record = SampleQueryRecord {
        table: "orders".to_string(),
        sql: "SELECT SUM(amount) FROM orders".to_string(),
    };

    let doc = render_sample_query(&record);
    assert_eq!(doc.table, "orders");
    assert_eq!(
        doc.content,
        "Table: orders, Sample Query: SELECT SUM(amount) FROM orders"
    );
}

#[test]
fn documents_preserve_record_order() {
    let metadata: SchemaMetadata = toml::from_str(SAMPLE_BUNDLE).expect("should parse toml");
    let docs = metadata.table_documents();
    assert_eq!(docs[0].table, "orders");
    assert_eq!(docs[1].table, "customers");

    let column_docs = metadata.column_documents();
    assert_eq!(column_docs.len(), 3);
    assert!(column_docs[1].content.contains("Column: amount"));
}
