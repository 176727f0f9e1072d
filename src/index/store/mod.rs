
use super::CollectionKind;
use crate::SqlPilotError;
use crate::config::Config;
use crate::metadata::SchemaDocument;
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Vector index over the three schema collections, owning its LanceDB
/// connection and the on-disk directory underneath it. Built once per
/// process and read-only afterwards.
pub struct SchemaIndex {
    connection: Connection,
    db_path: PathBuf,
    default_dimension: usize,
}

/// One retrieval hit, nearest-first. `table` is the identifier stored as a
/// first-class column at index-build time, so query time never parses the
/// rendered `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub table: String,
    pub content: String,
    pub distance: f32,
}

impl SchemaIndex {
    /// Open (or create) the index directory configured under the base dir
    #[inline]
    pub async fn open(config: &Config) -> Result<Self, SqlPilotError> {
        let db_path = config.vector_db_path();
        debug!("Opening LanceDB index at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SqlPilotError::Index(format!("Failed to create vector index directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| SqlPilotError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            db_path,
            default_dimension: config.ollama.embedding_dimension as usize,
        })
    }

    /// Rebuild one collection from scratch: drop the previous table, clean
    /// its on-disk directory, recreate it empty, and insert every document
    /// in a single batch with freshly generated ids. Destructive: whatever
    /// was indexed before is gone after this returns.
    #[inline]
    pub async fn rebuild_collection(
        &self,
        kind: CollectionKind,
        documents: &[SchemaDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, SqlPilotError> {
        if documents.len() != embeddings.len() {
            return Err(SqlPilotError::Index(format!(
                "Document/embedding count mismatch for {}: {} vs {}",
                kind,
                documents.len(),
                embeddings.len()
            )));
        }

        self.drop_collection_if_exists(kind).await?;
        self.remove_collection_dir(kind).await;

        let dimension = embeddings.first().map_or(self.default_dimension, Vec::len);
        let schema = collection_schema(dimension);

        self.connection
            .create_empty_table(kind.table_name(), Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to create collection {}: {}", kind, e))
            })?;

        if documents.is_empty() {
            info!("Rebuilt collection {} with no documents", kind);
            return Ok(0);
        }

        let batch = build_record_batch(&schema, documents, embeddings, dimension)?;
        let table = self
            .connection
            .open_table(kind.table_name())
            .execute()
            .await
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to open collection {}: {}", kind, e))
            })?;

        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table.add(reader).execute().await.map_err(|e| {
            SqlPilotError::Index(format!("Failed to insert into collection {}: {}", kind, e))
        })?;

        info!(
            "Rebuilt collection {} with {} documents",
            kind,
            documents.len()
        );
        Ok(documents.len())
    }

    /// Nearest-neighbor search over one collection, nearest first, at most
    /// `limit` results. A collection that was never built yields an empty
    /// result, not an error.
    #[inline]
    pub async fn search(
        &self,
        kind: CollectionKind,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, SqlPilotError> {
        if !self.collection_exists(kind).await? {
            debug!("Collection {} does not exist yet, returning no results", kind);
            return Ok(Vec::new());
        }

        let table = self
            .connection
            .open_table(kind.table_name())
            .execute()
            .await
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to open collection {}: {}", kind, e))
            })?;

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to create vector search: {}", e))
            })?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| SqlPilotError::Index(format!("Failed to execute search: {}", e)))?;

        let mut scored = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| SqlPilotError::Index(format!("Failed to read result stream: {}", e)))?
        {
            scored.extend(parse_search_batch(&batch)?);
        }

        debug!("Search in {} returned {} documents", kind, scored.len());
        Ok(scored)
    }

    /// Number of documents in one collection (0 when it was never built)
    #[inline]
    pub async fn count(&self, kind: CollectionKind) -> Result<usize, SqlPilotError> {
        if !self.collection_exists(kind).await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(kind.table_name())
            .execute()
            .await
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to open collection {}: {}", kind, e))
            })?;

        table
            .count_rows(None)
            .await
            .map_err(|e| SqlPilotError::Index(format!("Failed to count rows: {}", e)))
    }

    async fn collection_exists(&self, kind: CollectionKind) -> Result<bool, SqlPilotError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| SqlPilotError::Index(format!("Failed to list collections: {}", e)))?;

        Ok(table_names.iter().any(|name| name == kind.table_name()))
    }

    async fn drop_collection_if_exists(&self, kind: CollectionKind) -> Result<(), SqlPilotError> {
        if !self.collection_exists(kind).await? {
            debug!("Collection {} not present, skipping drop", kind);
            return Ok(());
        }

        info!("Dropping existing collection {}", kind);
        self.connection
            .drop_table(kind.table_name())
            .await
            .map_err(|e| {
                SqlPilotError::Index(format!("Failed to drop collection {}: {}", kind, e))
            })
    }

    /// Remove the collection's on-disk directory, retrying once after a
    /// short delay to ride out transient file locks. A second failure is
    /// logged and ignored; table creation will surface anything fatal.
    async fn remove_collection_dir(&self, kind: CollectionKind) {
        let dir = self.db_path.join(format!("{}.lance", kind.table_name()));
        if !dir.exists() {
            return;
        }

        if let Err(first) = std::fs::remove_dir_all(&dir) {
            warn!("Failed to delete {:?}: {}, retrying", dir, first);
            tokio::time::sleep(Duration::from_secs(1)).await;

            if let Err(second) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to delete {:?} after retry: {}", dir, second);
            } else {
                debug!("Deleted {:?} on retry", dir);
            }
        } else {
            debug!("Deleted {:?}", dir);
        }
    }
}

fn collection_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("table_name", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn build_record_batch(
    schema: &Arc<Schema>,
    documents: &[SchemaDocument],
    embeddings: &[Vec<f32>],
    dimension: usize,
) -> Result<RecordBatch, SqlPilotError> {
    let len = documents.len();
    let created_at = chrono::Utc::now().to_rfc3339();

    let mut ids = Vec::with_capacity(len);
    let mut table_names = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);

    for document in documents {
        // Identity is assigned here, at build time; duplicate content is
        // allowed and produces duplicate entries.
        ids.push(Uuid::new_v4().to_string());
        table_names.push(document.table.as_str());
        contents.push(document.content.as_str());
        created_ats.push(created_at.as_str());
    }

    let mut flat_values = Vec::with_capacity(len * dimension);
    for vector in embeddings {
        flat_values.extend_from_slice(vector);
    }
    let values_array = Float32Array::from(flat_values);
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, dimension as i32, Arc::new(values_array), None)
            .map_err(|e| SqlPilotError::Index(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(table_names)),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|e| SqlPilotError::Index(format!("Failed to create record batch: {}", e)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<ScoredDocument>, SqlPilotError> {
    let num_rows = batch.num_rows();

    let table_names = batch
        .column_by_name("table_name")
        .ok_or_else(|| SqlPilotError::Index("Missing table_name column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| SqlPilotError::Index("Invalid table_name column type".to_string()))?;

    let contents = batch
        .column_by_name("content")
        .ok_or_else(|| SqlPilotError::Index("Missing content column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| SqlPilotError::Index("Invalid content column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut scored = Vec::with_capacity(num_rows);
    for row in 0..num_rows {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        scored.push(ScoredDocument {
            table: table_names.value(row).to_string(),
            content: contents.value(row).to_string(),
            distance,
        });
    }

    Ok(scored)
}
