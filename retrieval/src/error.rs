use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Unknown retrieval strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse TOML configuration: {0}")]
    TomlConfig(#[from] toml::de::Error),

    #[error("Failed to parse JSON configuration: {0}")]
    JsonConfig(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
