use thiserror::Error;

pub type Result<T> = std::result::Result<T, SqlPilotError>;

#[derive(Error, Debug)]
pub enum SqlPilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod index;
pub mod metadata;
pub mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
