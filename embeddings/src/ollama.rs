use crate::embedder::Embedder;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "nomic-embed-text";

/// Connection settings for an Ollama-compatible embedding endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server base URL, without trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_BASE_URL` and `EMBEDDING_MODEL`, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| default_base_url()),
            model: std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| default_model()),
            ..Default::default()
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Embedder talking to a local Ollama server.
///
/// The server embeds one prompt per request, so batches fan out through the
/// default [`Embedder::embed_batch`].
pub struct OllamaEmbedder {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, EmbeddingError> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!("Requesting embedding from {}", self.config.base_url);

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&EmbeddingRequest {
                model: &self.config.model,
                prompt: text.trim(),
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbeddingResponse = response.json().await?;
        if body.embedding.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        Ok(body.embedding)
    }
}
