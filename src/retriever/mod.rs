// Schema retriever
// Finds the tables closest to a question, then pulls the column and sample
// query documents scoped to those tables.

#[cfg(test)]
mod tests;

use anyhow::Result;
use tracing::{debug, warn};

use crate::index::{CollectionKind, SchemaIndex};

/// How many tables the question is matched against.
pub const TABLE_RESULT_COUNT: usize = 2;
/// How many column documents are pulled per matched table.
pub const COLUMN_RESULT_COUNT: usize = 5;
/// How many sample queries are pulled per matched table.
pub const SAMPLE_QUERY_RESULT_COUNT: usize = 2;

/// Text-to-vector seam. The production implementation is `OllamaClient`;
/// tests substitute a deterministic stub.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// The schema subset retrieved for one question, in retrieval order with
/// duplicates preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetrievedSchema {
    pub tables: Vec<String>,
    pub column_docs: Vec<String>,
    pub query_docs: Vec<String>,
}

impl RetrievedSchema {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.column_docs.is_empty() && self.query_docs.is_empty()
    }
}

pub struct SchemaRetriever<'a, E: Embedder> {
    index: &'a SchemaIndex,
    embedder: &'a E,
}

impl<'a, E: Embedder> SchemaRetriever<'a, E> {
    #[inline]
    pub fn new(index: &'a SchemaIndex, embedder: &'a E) -> Self {
        Self { index, embedder }
    }

    /// Retrieve the schema subset relevant to a free-text question.
    ///
    /// An empty result is valid: a question that matches no tables simply
    /// produces an empty context downstream. Hits whose stored table
    /// identifier is empty are skipped with a warning.
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedSchema> {
        debug!("Retrieving schema for question (length: {})", question.len());

        let question_vector = self.embedder.embed(question)?;
        let table_hits = self
            .index
            .search(CollectionKind::Tables, &question_vector, TABLE_RESULT_COUNT)
            .await?;

        let mut tables = Vec::with_capacity(table_hits.len());
        for hit in table_hits {
            if hit.table.trim().is_empty() {
                warn!("No table identifier on retrieved document: {}", hit.content);
                continue;
            }
            tables.push(hit.table);
        }

        debug!("Question matched tables: {:?}", tables);

        let mut column_docs = Vec::new();
        for table in &tables {
            let vector = self.embedder.embed(&format!("Columns of {table}"))?;
            let hits = self
                .index
                .search(CollectionKind::Columns, &vector, COLUMN_RESULT_COUNT)
                .await?;
            column_docs.extend(hits.into_iter().map(|hit| hit.content));
        }

        let mut query_docs = Vec::new();
        for table in &tables {
            let vector = self.embedder.embed(&format!("Sample queries for {table}"))?;
            let hits = self
                .index
                .search(
                    CollectionKind::SampleQueries,
                    &vector,
                    SAMPLE_QUERY_RESULT_COUNT,
                )
                .await?;
            query_docs.extend(hits.into_iter().map(|hit| hit.content));
        }

        debug!(
            "Retrieved {} tables, {} column docs, {} sample queries",
            tables.len(),
            column_docs.len(),
            query_docs.len()
        );

        Ok(RetrievedSchema {
            tables,
            column_docs,
            query_docs,
        })
    }
}
