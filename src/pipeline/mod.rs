// End-to-end question pipeline
// Owns the schema index, the Ollama client, and the MySQL pool, and wires
// retrieval, prompt assembly, generation, and execution together.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::database::{Database, ExecutionOutcome};
use crate::index::{CollectionKind, SchemaIndex};
use crate::metadata::{SchemaDocument, SchemaMetadata};
use crate::ollama::OllamaClient;
use crate::prompt::{self, CompletionOptions, GeneratedQuery};
use crate::retriever::SchemaRetriever;

/// All pipeline state, constructed once from config and read-only while
/// questions are being answered.
pub struct QueryPipeline {
    index: SchemaIndex,
    ollama: OllamaClient,
    database: Database,
    options: CompletionOptions,
}

/// Everything produced while answering one question. The generated SQL is
/// kept even when execution failed so callers can show it for debugging.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub context: String,
    pub generated: GeneratedQuery,
    pub outcome: Option<ExecutionOutcome>,
}

impl Answer {
    #[inline]
    pub fn sql(&self) -> Option<&str> {
        self.generated.sql.as_deref()
    }
}

/// Document counts after a full index rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub tables: usize,
    pub columns: usize,
    pub sample_queries: usize,
}

impl IndexStats {
    #[inline]
    pub fn total(&self) -> usize {
        self.tables + self.columns + self.sample_queries
    }
}

impl QueryPipeline {
    #[inline]
    pub async fn connect(config: &Config) -> Result<Self> {
        let index = SchemaIndex::open(config)
            .await
            .context("Failed to open schema index")?;
        let ollama = OllamaClient::new(config).context("Failed to create Ollama client")?;
        let database = Database::connect(config);
        let options = CompletionOptions {
            temperature: config.ollama.temperature,
            max_tokens: config.ollama.max_tokens,
        };

        Ok(Self {
            index,
            ollama,
            database,
            options,
        })
    }

    #[inline]
    pub fn index(&self) -> &SchemaIndex {
        &self.index
    }

    #[inline]
    pub fn ollama(&self) -> &OllamaClient {
        &self.ollama
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Rebuild all three collections from the metadata bundle. Must complete
    /// before retrieval is attempted; until then searches come back empty.
    #[inline]
    pub async fn rebuild_index(&self, metadata: &SchemaMetadata) -> Result<IndexStats> {
        let tables = self
            .rebuild_one(CollectionKind::Tables, metadata.table_documents())
            .await?;
        let columns = self
            .rebuild_one(CollectionKind::Columns, metadata.column_documents())
            .await?;
        let sample_queries = self
            .rebuild_one(
                CollectionKind::SampleQueries,
                metadata.sample_query_documents(),
            )
            .await?;

        let stats = IndexStats {
            tables,
            columns,
            sample_queries,
        };
        info!(
            "Index rebuilt: {} tables, {} columns, {} sample queries",
            stats.tables, stats.columns, stats.sample_queries
        );
        Ok(stats)
    }

    async fn rebuild_one(
        &self,
        kind: CollectionKind,
        documents: Vec<SchemaDocument>,
    ) -> Result<usize> {
        debug!("Embedding {} {}", documents.len(), kind.describe());

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self
            .ollama
            .generate_embeddings_batch(&texts)
            .with_context(|| format!("Failed to embed {}", kind.describe()))?;

        let count = self
            .index
            .rebuild_collection(kind, &documents, &embeddings)
            .await?;
        Ok(count)
    }

    /// Answer one question end to end: retrieve the relevant schema subset,
    /// assemble the prompt context, generate SQL, and (optionally) execute
    /// it. Extraction and execution failures are contained in the returned
    /// `Answer`; only infrastructure failures (index, oracle transport)
    /// error out.
    #[inline]
    pub async fn answer(&self, question: &str, execute: bool) -> Result<Answer> {
        info!("Answering question: {}", question);

        let retriever = SchemaRetriever::new(&self.index, &self.ollama);
        let retrieved = retriever
            .retrieve(question)
            .await
            .context("Schema retrieval failed")?;

        let context = prompt::assemble_context(&retrieved);
        let generated = prompt::generate_query(&self.ollama, question, &context, &self.options)?;

        let outcome = match (&generated.sql, execute) {
            (Some(sql), true) => Some(self.database.execute(sql).await),
            _ => None,
        };

        Ok(Answer {
            question: question.to_string(),
            context,
            generated,
            outcome,
        })
    }
}
