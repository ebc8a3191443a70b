use thiserror::Error;

pub type Result<T> = std::result::Result<T, BookrecError>;

#[derive(Error, Debug)]
pub enum BookrecError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod catalog;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod engine;
pub mod indexer;
pub mod output;
pub mod server;
