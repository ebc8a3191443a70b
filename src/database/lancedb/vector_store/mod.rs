
use super::{BookEmbedding, ScoredBook};
use crate::config::Config;
use crate::{BookrecError, Result};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "books";

/// Vector database store using LanceDB for similarity search over book
/// description embeddings.
pub struct VectorStore {
    connection: Connection,
    vector_dimension: usize,
}

impl VectorStore {
    /// Create the books table, ready for indexing. Fails if the table
    /// already exists unless `rebuild` is set, in which case the existing
    /// table is dropped first.
    #[inline]
    pub async fn create(config: &Config, rebuild: bool) -> Result<Self> {
        let connection = connect(config).await?;
        let vector_dimension = config.ollama.embedding_dimension as usize;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&TABLE_NAME.to_string()) {
            if !rebuild {
                return Err(BookrecError::Store(
                    "Vector store already exists; pass --rebuild to replace it".to_string(),
                ));
            }
            info!("Dropping existing books table for rebuild");
            connection
                .drop_table(TABLE_NAME)
                .await
                .map_err(|e| BookrecError::Store(format!("Failed to drop table: {}", e)))?;
        }

        let schema = create_schema(vector_dimension);
        connection
            .create_empty_table(TABLE_NAME, schema)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to create table: {}", e)))?;

        info!(
            "Created books table with {} dimensions",
            vector_dimension
        );

        Ok(Self {
            connection,
            vector_dimension,
        })
    }

    /// Open an existing store for searching. Fails if the books table has
    /// never been created. The vector dimension is read back from the
    /// stored schema rather than trusted from config.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        let connection = connect(config).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&TABLE_NAME.to_string()) {
            return Err(BookrecError::Store(
                "Vector store has not been built yet; run `bookrec index` first".to_string(),
            ));
        }

        let table = connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to open table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to get table schema: {}", e)))?;

        let vector_dimension = schema
            .fields()
            .iter()
            .find_map(|field| {
                if field.name() == "vector" {
                    if let DataType::FixedSizeList(_, size) = field.data_type() {
                        return Some(*size as usize);
                    }
                }
                None
            })
            .ok_or_else(|| {
                BookrecError::Store(
                    "Could not find vector column or determine dimension".to_string(),
                )
            })?;

        debug!("Opened books table with {} dimensions", vector_dimension);

        Ok(Self {
            connection,
            vector_dimension,
        })
    }

    /// Dimension of the stored vectors.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector_dimension
    }

    /// Store a batch of book embeddings.
    #[inline]
    pub async fn insert_batch(&self, records: &[BookEmbedding]) -> Result<()> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        debug!("Storing batch of {} embeddings", records.len());

        for record in records {
            if record.vector.len() != self.vector_dimension {
                return Err(BookrecError::Store(format!(
                    "Embedding for ISBN {} has {} dimensions, expected {}",
                    record.isbn13,
                    record.vector.len(),
                    self.vector_dimension
                )));
            }
        }

        let record_batch = self.create_record_batch(records)?;

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to open table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to insert embeddings: {}", e)))?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    /// Nearest-neighbor search over stored book vectors. Results come back
    /// ordered by ascending distance.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredBook>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to open table: {}", e)))?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| BookrecError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let mut results = query
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to execute search: {}", e)))?;

        let mut scored = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to read result stream: {}", e)))?
        {
            scored.extend(parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results", scored.len());
        Ok(scored)
    }

    /// Total number of embeddings stored.
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Create an ANN index on the vector column. Only worthwhile once the
    /// table holds enough rows for LanceDB to train the index.
    #[inline]
    pub async fn create_vector_index(&self) -> Result<()> {
        debug!("Creating vector index");

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to open table: {}", e)))?;

        table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .map_err(|e| BookrecError::Store(format!("Failed to create vector index: {}", e)))?;

        info!("Vector index created");
        Ok(())
    }

    fn create_record_batch(&self, records: &[BookEmbedding]) -> Result<RecordBatch> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        let mut ids = Vec::with_capacity(len);
        let mut isbn13s = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for record in records {
            ids.push(record.id.as_str());
            isbn13s.push(record.isbn13);
            created_ats.push(record.created_at.as_str());
            flat_values.extend_from_slice(&record.vector);
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    BookrecError::Store(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(Int64Array::from(isbn13s)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(create_schema(vector_dim), arrays)
            .map_err(|e| BookrecError::Store(format!("Failed to create record batch: {}", e)))
    }
}

async fn connect(config: &Config) -> Result<Connection> {
    let db_path = config.vector_db_path();
    debug!("Connecting to LanceDB at path: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            BookrecError::Store(format!("Failed to create vector database directory: {}", e))
        })?;
    }

    let uri = format!("file://{}", db_path.display());
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| BookrecError::Store(format!("Failed to connect to LanceDB: {}", e)))
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("isbn13", DataType::Int64, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<ScoredBook>> {
    let num_rows = batch.num_rows();

    let isbn13s = batch
        .column_by_name("isbn13")
        .ok_or_else(|| BookrecError::Store("Missing isbn13 column".to_string()))?
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| BookrecError::Store("Invalid isbn13 column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut results = Vec::with_capacity(num_rows);
    for row in 0..num_rows {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        // Convert distance to similarity score (higher is better)
        results.push(ScoredBook {
            isbn13: isbn13s.value(row),
            distance,
            similarity: 1.0 - distance,
        });
    }

    Ok(results)
}

#[async_trait::async_trait]
impl crate::engine::VectorIndex for VectorStore {
    #[inline]
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredBook>> {
        Self::search(self, query_vector, limit).await
    }

    async fn count(&self) -> Result<u64> {
        Self::count(self).await
    }
}
