// Embeddings module
// Wraps the Ollama HTTP API used for sentence embeddings

pub mod ollama;

pub use ollama::{ModelInfo, OllamaClient};
