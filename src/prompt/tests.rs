use super::*;

struct CannedOracle {
    response: String,
}

impl CompletionOracle for CannedOracle {
    fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        Ok(self.response.clone())
    }
}

struct RecordingOracle {
    response: String,
    seen_prompt: std::sync::Mutex<Option<String>>,
}

impl CompletionOracle for RecordingOracle {
    fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        *self
            .seen_prompt
            .lock()
            .expect("should lock prompt recorder") = Some(prompt.to_string());
        Ok(self.response.clone())
    }
}

fn options() -> CompletionOptions {
    CompletionOptions {
        temperature: 0.2,
        max_tokens: 512,
    }
}

fn sample_schema() -> RetrievedSchema {
    RetrievedSchema {
        tables: vec!["orders".to_string()],
        column_docs: vec![
            "Table: orders, Column: id, Data Type: INT, Primary Key: Yes, \
             Foreign Key: None, Description: Order identifier"
                .to_string(),
            "Table: orders, Column: amount, Data Type: DECIMAL(10,2), Primary Key: No, \
             Foreign Key: None, Description: No Info"
                .to_string(),
        ],
        query_docs: vec!["Table: orders, Sample Query: SELECT SUM(amount) FROM orders".to_string()],
    }
}

#[test]
fn context_sections_are_ordered() {
    let context = assemble_context(&sample_schema());

    let tables_at = context.find("orders").expect("should contain table name");
    let columns_at = context
        .find("Column: id")
        .expect("should contain column doc");
    let header_at = context
        .find("Sample Queries:")
        .expect("should contain sample query header");
    let queries_at = context
        .find("Sample Query: SELECT")
        .expect("should contain sample query doc");

    assert!(tables_at < columns_at);
    assert!(columns_at < header_at);
    assert!(header_at < queries_at);
}

#[test]
fn context_keeps_documents_verbatim() {
    let schema = sample_schema();
    let context = assemble_context(&schema);

    for doc in schema.column_docs.iter().chain(schema.query_docs.iter()) {
        assert!(context.contains(doc), "context should contain: {doc}");
    }
}

#[test]
fn context_is_deterministic() {
    let schema = sample_schema();
    assert_eq!(assemble_context(&schema), assemble_context(&schema));
}

#[test]
fn empty_schema_still_assembles() {
    let context = assemble_context(&RetrievedSchema::default());
    assert!(context.contains("Sample Queries:"));
}

#[test]
fn prompt_embeds_question_and_context() {
    let prompt = build_prompt("total amount of all orders", "THE CONTEXT BLOCK");

    assert!(prompt.contains("total amount of all orders"));
    assert!(prompt.contains("THE CONTEXT BLOCK"));
    assert!(prompt.contains("```sql"));
    assert!(prompt.contains("Return ONLY the SQL query"));
}

#[test]
fn extracts_fenced_sql() {
    let sql = extract_sql("noise ```sql SELECT 1; ``` trailing");
    assert_eq!(sql.as_deref(), Some("SELECT 1;"));
}

#[test]
fn extracts_multiline_sql() {
    let response = "Here you go:\n```sql\nSELECT id, amount\nFROM orders\nWHERE amount > 10;\n```\nLet me know if that helps.";
    let sql = extract_sql(response);
    assert_eq!(
        sql.as_deref(),
        Some("SELECT id, amount\nFROM orders\nWHERE amount > 10;")
    );
}

#[test]
fn extracts_first_block_only() {
    let response = "```sql SELECT 1; ``` and also ```sql SELECT 2; ```";
    let sql = extract_sql(response);
    assert_eq!(sql.as_deref(), Some("SELECT 1;"));
}

#[test]
fn missing_fence_yields_none() {
    assert_eq!(extract_sql("SELECT 1;"), None);
    assert_eq!(extract_sql(""), None);
}

#[test]
fn empty_fenced_block_yields_none() {
    assert_eq!(extract_sql("```sql   ```"), None);
}

#[test]
fn unterminated_fence_takes_rest_of_response() {
    let sql = extract_sql("```sql\nSELECT 1;");
    assert_eq!(sql.as_deref(), Some("SELECT 1;"));
}

#[test]
fn generate_query_extracts_sql() {
    let oracle = CannedOracle {
        response: "```sql\nSELECT SUM(amount) FROM orders;\n```".to_string(),
    };

    let generated =
        generate_query(&oracle, "total amount", "context", &options()).expect("should generate");

    assert_eq!(
        generated.sql.as_deref(),
        Some("SELECT SUM(amount) FROM orders;")
    );
    assert_eq!(
        generated.raw_response,
        "```sql\nSELECT SUM(amount) FROM orders;\n```"
    );
}

#[test]
fn generate_query_without_fence_keeps_raw_response() {
    let oracle = CannedOracle {
        response: "I cannot answer that.".to_string(),
    };

    let generated =
        generate_query(&oracle, "total amount", "context", &options()).expect("should generate");

    assert_eq!(generated.sql, None);
    assert_eq!(generated.raw_response, "I cannot answer that.");
}

#[test]
fn generate_query_sends_assembled_prompt() {
    let oracle = RecordingOracle {
        response: "```sql SELECT 1; ```".to_string(),
        seen_prompt: std::sync::Mutex::new(None),
    };

    let schema = sample_schema();
    let context = assemble_context(&schema);
    generate_query(&oracle, "total amount of all orders", &context, &options())
        .expect("should generate");

    let prompt = oracle
        .seen_prompt
        .lock()
        .expect("should lock prompt recorder")
        .clone()
        .expect("oracle should have been called");

    assert!(prompt.contains("total amount of all orders"));
    for doc in &schema.column_docs {
        assert!(prompt.contains(doc), "prompt should contain: {doc}");
    }
}
