// Indexer module
// Embeds every catalog description and writes the vectors to LanceDB


use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Book, Catalog};
use crate::config::Config;
use crate::database::{BookEmbedding, VectorStore};
use crate::embeddings::OllamaClient;
use crate::{BookrecError, Result};

/// Summary of one indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub total_books: usize,
    pub indexed: usize,
    pub skipped_no_description: usize,
}

/// Builds the vector store from the book catalog.
pub struct Indexer {
    client: OllamaClient,
    config: Config,
}

impl Indexer {
    #[inline]
    pub fn new(client: OllamaClient, config: Config) -> Self {
        Self { client, config }
    }

    /// Embed every book with a non-empty description and persist the
    /// vectors. Existing data is only replaced when `rebuild` is set.
    #[inline]
    pub async fn build(&self, catalog: &Catalog, rebuild: bool) -> Result<IndexStats> {
        self.client
            .health_check()
            .map_err(|e| BookrecError::Embedding(format!("{:#}", e)))?;

        let store = VectorStore::create(&self.config, rebuild).await?;

        let mut embeddable: Vec<&Book> = catalog
            .books()
            .filter(|book| !book.description.trim().is_empty())
            .collect();
        // Stable order keeps runs reproducible and logs readable.
        embeddable.sort_by_key(|book| book.isbn13);

        let skipped_no_description = catalog.len() - embeddable.len();
        if skipped_no_description > 0 {
            warn!(
                "Skipping {} books with no description",
                skipped_no_description
            );
        }

        info!("Embedding {} book descriptions", embeddable.len());

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(embeddable.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding books")
                    .expect("style template is valid"),
            )
        } else {
            ProgressBar::hidden()
        };

        let expected_dim = self.config.ollama.embedding_dimension as usize;
        let batch_size = self.client.batch_size() as usize;
        let mut indexed = 0usize;

        for batch in embeddable.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|book| book.description.clone()).collect();

            let vectors = self
                .client
                .embed_batch(&texts)
                .map_err(|e| BookrecError::Embedding(format!("{:#}", e)))?;

            let created_at = Utc::now().to_rfc3339();
            let mut records = Vec::with_capacity(batch.len());
            for (book, vector) in batch.iter().zip(vectors) {
                if vector.len() != expected_dim {
                    return Err(BookrecError::Embedding(format!(
                        "Model returned {} dimensions for ISBN {}, expected {}; \
                         check the configured embedding_dimension",
                        vector.len(),
                        book.isbn13,
                        expected_dim
                    )));
                }
                records.push(BookEmbedding {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    isbn13: book.isbn13,
                    created_at: created_at.clone(),
                });
            }

            store.insert_batch(&records).await?;
            indexed += records.len();
            bar.inc(records.len() as u64);
            debug!("Indexed {}/{} books", indexed, embeddable.len());
        }

        bar.finish_and_clear();

        if let Err(e) = store.create_vector_index().await {
            // A brute-force scan still works without the ANN index; small
            // tables cannot train one at all.
            warn!("Could not create vector index: {}", e);
        }

        info!(
            "Indexing complete: {} embedded, {} skipped",
            indexed, skipped_no_description
        );

        Ok(IndexStats {
            total_books: catalog.len(),
            indexed,
            skipped_no_description,
        })
    }
}
