// Recommendation engine
// Embeds the query, fetches nearest neighbors, joins them back to the
// catalog, and applies the rating filter

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Book, Catalog};
use crate::config::SearchConfig;
use crate::database::ScoredBook;
use crate::{BookrecError, Result};

/// Turns query text into an embedding vector. Implemented by the Ollama
/// client; tests substitute a deterministic fake.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbor lookup over the persisted book vectors.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredBook>>;

    async fn count(&self) -> Result<u64>;
}

/// One recommended book with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub book: Book,
    pub similarity: f32,
}

/// Semantic book search engine. Holds the loaded catalog plus the embedding
/// and vector-store backends behind trait objects.
pub struct Engine {
    catalog: Catalog,
    embedder: Box<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    search: SearchConfig,
}

impl Engine {
    #[inline]
    pub fn new(
        catalog: Catalog,
        embedder: Box<dyn Embedder>,
        index: Box<dyn VectorIndex>,
        search: SearchConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            index,
            search,
        }
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Number of embeddings in the vector store.
    #[inline]
    pub async fn index_count(&self) -> Result<u64> {
        self.index.count().await
    }

    /// Recommend books for a natural-language query.
    ///
    /// `top_k` and `min_rating` fall back to the configured defaults when
    /// absent. A `min_rating` of 0.0 disables the rating filter. The query
    /// text is embedded as-is, including empty strings.
    #[inline]
    pub async fn recommend(
        &self,
        query: &str,
        top_k: Option<usize>,
        min_rating: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        let top_k = top_k.unwrap_or(self.search.default_top_k);
        let min_rating = min_rating.unwrap_or(self.search.default_min_rating);

        if top_k == 0 {
            return Err(BookrecError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        if top_k > self.search.max_top_k {
            return Err(BookrecError::InvalidArgument(format!(
                "top_k must be at most {}",
                self.search.max_top_k
            )));
        }
        if min_rating.is_nan() || !(0.0..=5.0).contains(&min_rating) {
            return Err(BookrecError::InvalidArgument(format!(
                "min_rating must be between 0 and 5, got {}",
                min_rating
            )));
        }

        let query_vector = self.embedder.embed(query)?;

        // Over-fetch when the rating filter is active so post-filtering
        // still leaves enough candidates to fill top_k.
        let filter_active = min_rating > 0.0;
        let fetch_k = if filter_active {
            top_k.saturating_mul(self.search.overfetch_factor)
        } else {
            top_k
        };

        debug!(
            "Searching for {} candidates (top_k: {}, min_rating: {})",
            fetch_k, top_k, min_rating
        );

        let candidates = self.index.search(&query_vector, fetch_k).await?;

        let mut recommendations = Vec::with_capacity(top_k);
        for scored in candidates {
            let Some(book) = self.catalog.get(scored.isbn13) else {
                warn!(
                    "Vector store references ISBN {} missing from catalog; skipping",
                    scored.isbn13
                );
                continue;
            };

            if filter_active && book.average_rating < min_rating {
                continue;
            }

            recommendations.push(Recommendation {
                book: book.clone(),
                similarity: scored.similarity,
            });

            if recommendations.len() == top_k {
                break;
            }
        }

        debug!("Returning {} recommendations", recommendations.len());
        Ok(recommendations)
    }
}
