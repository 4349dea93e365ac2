use crate::error::EmbeddingError;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Supported cross-encoder models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum CrossEncoderModel {
    /// BAAI bge-reranker-base
    #[default]
    BgeRerankerBase,
    /// Jina reranker v1 turbo (English, smaller)
    JinaRerankerV1TurboEn,
}

impl CrossEncoderModel {
    fn to_fastembed_model(self) -> RerankerModel {
        match self {
            CrossEncoderModel::BgeRerankerBase => RerankerModel::BGERerankerBase,
            CrossEncoderModel::JinaRerankerV1TurboEn => RerankerModel::JINARerankerV1TurboEn,
        }
    }
}

/// A relevance score for one query/document pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    /// Index of the document in the scored input
    pub index: usize,
    /// Raw cross-encoder relevance (higher is better, unbounded)
    pub score: f32,
}

/// Local cross-encoder scoring query/document pairs jointly
pub struct CrossEncoderService {
    model: TextRerank,
    batch_size: usize,
}

impl CrossEncoderService {
    /// Load the default cross-encoder model
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_model(CrossEncoderModel::default())
    }

    /// Load a specific cross-encoder model
    pub fn with_model(model: CrossEncoderModel) -> Result<Self, EmbeddingError> {
        info!("Loading cross-encoder {model:?}");

        let options = RerankInitOptions::new(model.to_fastembed_model());
        let model = TextRerank::try_new(options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to load cross-encoder: {e}"))
        })?;

        Ok(Self {
            model,
            batch_size: 32,
        })
    }

    /// Score every document against `query`, best first
    pub fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<PairScore>, EmbeddingError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Cross-encoding {} pairs", documents.len());

        let results = self
            .model
            .rerank(query, documents.to_vec(), false, Some(self.batch_size))
            .map_err(|e| EmbeddingError::Scoring(e.to_string()))?;

        let mut scores: Vec<PairScore> = results
            .into_iter()
            .map(|r| PairScore {
                index: r.index,
                score: r.score,
            })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));

        Ok(scores)
    }
}
