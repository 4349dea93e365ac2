use thiserror::Error;

/// Errors that can occur during vector store operations
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Invalid query provided
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query vector does not match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Snapshot requested on a store without a backing file
    #[error("Vector store has no snapshot path")]
    NoSnapshotPath,

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] vaultrag_embeddings::EmbeddingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
