use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] vaultrag_retrieval::RetrievalError),

    #[error("Failed to serialize context: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContextError>;
