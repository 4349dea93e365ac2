use thiserror::Error;

/// Errors that can occur during embedding and cross-encoder operations
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitialization(String),

    /// Failed to generate embeddings
    #[error("Failed to generate embeddings: {0}")]
    EmbeddingGeneration(String),

    /// Failed to score query/document pairs
    #[error("Failed to score pairs: {0}")]
    Scoring(String),

    /// Invalid input provided to embedding service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding endpoint could not be reached or answered with an error status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered but carried no vector
    #[error("Empty embedding returned for input")]
    EmptyEmbedding,
}

impl From<fastembed::Error> for EmbeddingError {
    fn from(err: fastembed::Error) -> Self {
        EmbeddingError::EmbeddingGeneration(err.to_string())
    }
}
