use crate::embedder::Embedder;
use crate::error::EmbeddingError;
use crate::{COMPACT_EMBEDDING_DIM, DEFAULT_EMBEDDING_DIM};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Configuration for the local embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    pub model: EmbeddingModelType,

    /// Target embedding dimension (for Matryoshka truncation)
    pub dimension: usize,

    /// Maximum batch size for embedding generation
    pub batch_size: usize,

    /// Show download progress when downloading models
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelType::NomicEmbedTextV15,
            dimension: DEFAULT_EMBEDDING_DIM,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}

/// Supported local embedding models
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EmbeddingModelType {
    /// Nomic-embed-text-v1.5 (same family the HTTP backend defaults to)
    NomicEmbedTextV15,
    /// All-MiniLM-L6-v2 (lightweight, faster)
    AllMiniLmL6V2,
}

impl EmbeddingModelType {
    fn to_fastembed_model(self) -> EmbeddingModel {
        match self {
            EmbeddingModelType::NomicEmbedTextV15 => EmbeddingModel::NomicEmbedTextV15,
            EmbeddingModelType::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
        }
    }
}

/// On-device embedder backed by an ONNX model
pub struct LocalEmbedder {
    model: TextEmbedding,
    config: EmbeddingConfig,
}

impl LocalEmbedder {
    /// Create a local embedder with default configuration
    pub async fn new() -> Result<Self, EmbeddingError> {
        Self::with_config(EmbeddingConfig::default()).await
    }

    /// Create a local embedder with custom configuration
    pub async fn with_config(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        info!(
            "Initializing local embedder with model {:?}, dimension {}",
            config.model, config.dimension
        );

        let init_options = InitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to initialize model: {e}"))
        })?;

        info!("Local embedder initialized successfully");

        Ok(Self { model, config })
    }

    /// Create a compact local embedder (256 dimensions)
    pub async fn new_compact() -> Result<Self, EmbeddingError> {
        let config = EmbeddingConfig {
            dimension: COMPACT_EMBEDDING_DIM,
            ..Default::default()
        };
        Self::with_config(config).await
    }

    /// Run the model over `texts` in configured batch sizes
    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in text_refs.chunks(self.config.batch_size.max(1)) {
            let batch_embeddings = self.model.embed(chunk.to_vec(), None)?;

            for mut embedding in batch_embeddings {
                // Matryoshka truncation
                if embedding.len() > self.config.dimension {
                    embedding.truncate(self.config.dimension);
                }
                all_embeddings.push(embedding);
            }
        }

        Ok(all_embeddings)
    }

    /// Get the configuration of this embedder
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("empty text".to_string()));
        }

        let mut embeddings = self.embed_all(&[text.to_string()])?;
        embeddings.pop().ok_or(EmbeddingError::EmptyEmbedding)
    }

    /// The model batches natively, so chunks replace the per-text fan-out.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        embed_in_chunks(texts, self.config.batch_size, |chunk| self.embed_all(chunk))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.config.dimension)
    }
}

/// Embed `texts` a chunk at a time. A failed chunk is retried text by text
/// so only the texts that fail on their own are dropped.
fn embed_in_chunks<F>(texts: &[String], chunk_size: usize, run: F) -> Vec<Vec<f32>>
where
    F: Fn(&[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>,
{
    let mut embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(chunk_size.max(1)) {
        match run(chunk) {
            Ok(batch) => embeddings.extend(batch),
            Err(e) => {
                warn!("Embedding chunk of {} texts failed, retrying singly: {e}", chunk.len());
                for text in chunk {
                    match run(std::slice::from_ref(text)) {
                        Ok(single) => embeddings.extend(single),
                        Err(e) => warn!("Dropping text from embedding batch: {e}"),
                    }
                }
            }
        }
    }

    embeddings.retain(|embedding| !embedding.is_empty());
    debug!("Embedded {} of {} texts", embeddings.len(), texts.len());
    embeddings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    #[ignore = "Requires downloading embedding model"]
    async fn test_default_config() {
        let embedder = LocalEmbedder::new().await.unwrap();
        assert_eq!(embedder.dimension(), Some(DEFAULT_EMBEDDING_DIM));
    }

    #[tokio::test]
    #[ignore = "Requires downloading embedding model"]
    async fn test_compact_config() {
        let embedder = LocalEmbedder::new_compact().await.unwrap();
        let embedding = embedder.embed("graph traversal").await.unwrap();
        assert_eq!(embedding.len(), COMPACT_EMBEDDING_DIM);
    }

    #[tokio::test]
    #[ignore = "Requires downloading embedding model"]
    async fn test_batch_matches_input() {
        let embedder = LocalEmbedder::new().await.unwrap();
        let texts: Vec<String> = (0..40).map(|i| format!("note number {i}")).collect();

        let embeddings = embedder.embed_batch(&texts).await;
        assert_eq!(embeddings.len(), texts.len());
    }

    #[tokio::test]
    #[ignore = "Requires downloading embedding model"]
    async fn test_blank_text_rejected() {
        let embedder = LocalEmbedder::new().await.unwrap();
        assert!(embedder.embed("   ").await.is_err());
    }

    /// Fails any call that includes a text starting with "bad"
    fn fake_model(chunk: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if chunk.iter().any(|text| text.starts_with("bad")) {
            return Err(EmbeddingError::EmbeddingGeneration("poisoned chunk".to_string()));
        }
        Ok(chunk.iter().map(|text| vec![text.len() as f32]).collect())
    }

    #[test]
    fn test_failed_chunk_only_drops_failing_texts() {
        let texts: Vec<String> = ["a", "bb", "bad", "dddd", "eeeee"]
            .into_iter()
            .map(String::from)
            .collect();

        let embeddings = embed_in_chunks(&texts, 2, fake_model);

        assert_eq!(
            embeddings,
            vec![vec![1.0], vec![2.0], vec![4.0], vec![5.0]]
        );
    }

    #[test]
    fn test_chunks_without_failures() {
        let texts: Vec<String> = (1..=5).map(|n| "x".repeat(n)).collect();

        let embeddings = embed_in_chunks(&texts, 0, fake_model);

        assert_eq!(embeddings.len(), 5);
        assert_eq!(embeddings[4], vec![5.0]);
    }

    #[test]
    fn test_default_embedding_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.dimension, DEFAULT_EMBEDDING_DIM);
        assert_eq!(config.batch_size, 32);
    }
}
