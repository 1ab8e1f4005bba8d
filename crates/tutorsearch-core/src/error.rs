use thiserror::Error;

/// One variant per way a search run can fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("PINECONE_API_KEY environment variable is not set")]
    MissingCredential,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load embedding model: {0}")]
    ModelLoad(String),

    #[error("Failed to connect to index '{index}': {reason}")]
    IndexConnection { index: String, reason: String },

    #[error("Failed to generate embedding: {0}")]
    Embedding(String),

    #[error("Query failed: {0}")]
    Query(String),
}

pub type Result<T> = std::result::Result<T, Error>;
