// Database module
// LanceDB-backed persistence for book embeddings

pub mod lancedb;

pub use lancedb::{BookEmbedding, ScoredBook, vector_store::VectorStore};
