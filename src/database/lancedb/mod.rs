// LanceDB vector database module
// Handles vector storage and similarity search for book embeddings


pub mod vector_store;

use serde::{Deserialize, Serialize};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookEmbedding {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding of the book description
    pub vector: Vec<f32>,
    /// ISBN-13 of the book, used to resolve the catalog record
    pub isbn13: i64,
    /// Timestamp when this embedding was created
    pub created_at: String,
}

/// One nearest-neighbor hit from the vector store. Carries only the
/// identifier; callers resolve the full book record from the catalog.
#[derive(Debug, Clone)]
pub struct ScoredBook {
    pub isbn13: i64,
    pub distance: f32,
    pub similarity: f32,
}
