// Schema metadata bundle
// Loads the table/column/sample-query record sets and renders each record
// into the single-line document text that gets embedded.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// A description of one database table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableRecord {
    pub name: String,
    pub description: String,
}

/// A description of one column, including key relationships
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnRecord {
    pub table: String,
    pub column: String,
    pub data_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A known-good SQL query against one table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SampleQueryRecord {
    pub table: String,
    pub sql: String,
}

/// The full metadata bundle, loaded once per index run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct SchemaMetadata {
    #[serde(default)]
    pub tables: Vec<TableRecord>,
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub sample_queries: Vec<SampleQueryRecord>,
}

/// A rendered document ready for embedding. The table identifier travels
/// alongside the text so retrieval never has to parse it back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub table: String,
    pub content: String,
}

impl SchemaMetadata {
    /// Load and validate the metadata bundle. Any malformed or incomplete
    /// record is a fatal load error; there is no partial-load mode.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata bundle: {}", path.display()))?;

        let metadata: SchemaMetadata = toml::from_str(&content)
            .with_context(|| format!("Failed to parse metadata bundle: {}", path.display()))?;

        metadata
            .validate()
            .with_context(|| format!("Invalid metadata bundle: {}", path.display()))?;

        info!(
            "Loaded schema metadata: {} tables, {} columns, {} sample queries",
            metadata.tables.len(),
            metadata.columns.len(),
            metadata.sample_queries.len()
        );

        Ok(metadata)
    }

    fn validate(&self) -> Result<()> {
        for record in &self.tables {
            if record.name.trim().is_empty() {
                bail!("table record with empty name");
            }
        }

        for record in &self.columns {
            if record.table.trim().is_empty() {
                bail!("column record with empty table name");
            }
            if record.column.trim().is_empty() {
                bail!("column record for table '{}' with empty column name", record.table);
            }
        }

        for record in &self.sample_queries {
            if record.table.trim().is_empty() {
                bail!("sample query record with empty table name");
            }
            if record.sql.trim().is_empty() {
                bail!(
                    "sample query record for table '{}' with empty SQL text",
                    record.table
                );
            }
        }

        Ok(())
    }

    #[inline]
    pub fn table_documents(&self) -> Vec<SchemaDocument> {
        self.tables.iter().map(render_table).collect()
    }

    #[inline]
    pub fn column_documents(&self) -> Vec<SchemaDocument> {
        self.columns.iter().map(render_column).collect()
    }

    #[inline]
    pub fn sample_query_documents(&self) -> Vec<SchemaDocument> {
        self.sample_queries.iter().map(render_sample_query).collect()
    }
}

/// `Table: {name}, Description: {description}`
#[inline]
pub fn render_table(record: &TableRecord) -> SchemaDocument {
    SchemaDocument {
        table: record.name.clone(),
        content: format!(
            "Table: {}, Description: {}",
            record.name, record.description
        ),
    }
}

/// One line per column. Missing optionals render as explicit placeholders so
/// every column document has the same shape.
#[inline]
pub fn render_column(record: &ColumnRecord) -> SchemaDocument {
    let primary_key = if record.primary_key { "Yes" } else { "No" };
    let foreign_key = record.foreign_key.as_deref().unwrap_or("None");
    let description = record.description.as_deref().unwrap_or("No Info");

    SchemaDocument {
        table: record.table.clone(),
        content: format!(
            "Table: {}, Column: {}, Data Type: {}, Primary Key: {}, Foreign Key: {}, Description: {}",
            record.table, record.column, record.data_type, primary_key, foreign_key, description
        ),
    }
}

/// `Table: {table}, Sample Query: {sql}`
#[inline]
pub fn render_sample_query(record: &SampleQueryRecord) -> SchemaDocument {
    SchemaDocument {
        table: record.table.clone(),
        content: format!("Table: {}, Sample Query: {}", record.table, record.sql),
    }
}
