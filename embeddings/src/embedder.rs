use crate::error::EmbeddingError;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};

/// Capability that turns text into fixed-length vectors.
///
/// `embed_batch` never fails as a whole: a text whose embedding fails is
/// dropped from the output, so the returned batch may be shorter than the
/// input and callers must not rely on positional correspondence.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed many texts, one concurrent request per text
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        let results = join_all(texts.iter().map(|text| self.embed(text))).await;
        let embeddings: Vec<Vec<f32>> = results
            .into_iter()
            .filter_map(|result| match result {
                Ok(embedding) if !embedding.is_empty() => Some(embedding),
                Ok(_) => None,
                Err(e) => {
                    warn!("Dropping text from embedding batch: {e}");
                    None
                }
            })
            .collect();

        debug!("Embedded {} of {} texts", embeddings.len(), texts.len());
        embeddings
    }

    /// Dimension of produced vectors, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FlakyEmbedder;

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            match text {
                "fail" => Err(EmbeddingError::EmbeddingGeneration("boom".to_string())),
                "empty" => Ok(Vec::new()),
                other => Ok(vec![other.len() as f32, 1.0]),
            }
        }
    }

    #[tokio::test]
    async fn test_batch_drops_failures() {
        let texts = vec![
            "abc".to_string(),
            "fail".to_string(),
            "empty".to_string(),
            "hello".to_string(),
        ];

        let embeddings = FlakyEmbedder.embed_batch(&texts).await;

        assert_eq!(embeddings, vec![vec![3.0, 1.0], vec![5.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let embeddings = FlakyEmbedder.embed_batch(&[]).await;
        assert!(embeddings.is_empty());
    }
}
