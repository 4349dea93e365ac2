use crate::result::{SearchResult, SearchSource, assign_ranks};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;
use vaultrag_embeddings::{CrossEncoderService, PairScore};

/// Result of a rerank pass
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    pub results: Vec<SearchResult>,
    /// False when candidates were passed through in input order
    pub applied: bool,
}

/// Reorders candidates by pairwise query relevance
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Return at most `n` candidates
    async fn rerank(&self, query: &str, candidates: Vec<SearchResult>, n: usize) -> RerankOutcome;
}

/// Keeps the first `n` candidates untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughReranker;

#[async_trait]
impl Reranker for PassthroughReranker {
    async fn rerank(&self, _query: &str, candidates: Vec<SearchResult>, n: usize) -> RerankOutcome {
        RerankOutcome {
            results: passthrough(candidates, n),
            applied: false,
        }
    }
}

fn passthrough(mut candidates: Vec<SearchResult>, n: usize) -> Vec<SearchResult> {
    candidates.truncate(n);
    assign_ranks(&mut candidates);
    candidates
}

/// Rescores candidates with a local cross-encoder model.
///
/// Inference is synchronous, so it runs on tokio's blocking pool.
pub struct CrossEncoderReranker {
    service: Arc<CrossEncoderService>,
}

impl CrossEncoderReranker {
    pub fn new(service: CrossEncoderService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn rerank(&self, query: &str, candidates: Vec<SearchResult>, n: usize) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome {
                results: candidates,
                applied: false,
            };
        }

        let service = Arc::clone(&self.service);
        let query = query.to_string();
        let contents: Vec<String> = candidates
            .iter()
            .map(|c| c.document.content.clone())
            .collect();

        let scored = tokio::task::spawn_blocking(move || {
            let documents: Vec<&str> = contents.iter().map(String::as_str).collect();
            service.score(&query, &documents)
        })
        .await;

        let scores = match scored {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => {
                warn!("Cross-encoder scoring failed, keeping fused order: {e}");
                return RerankOutcome {
                    results: passthrough(candidates, n),
                    applied: false,
                };
            }
            Err(e) => {
                warn!("Cross-encoder task did not complete, keeping fused order: {e}");
                return RerankOutcome {
                    results: passthrough(candidates, n),
                    applied: false,
                };
            }
        };

        let results = apply_scores(candidates, scores, n);
        debug!("Reranked to {} results", results.len());
        RerankOutcome {
            results,
            applied: true,
        }
    }
}

/// Reorder candidates by best-first pair scores, keeping at most `n`
fn apply_scores(candidates: Vec<SearchResult>, scores: Vec<PairScore>, n: usize) -> Vec<SearchResult> {
    let mut slots: Vec<Option<SearchResult>> = candidates.into_iter().map(Some).collect();
    let mut results: Vec<SearchResult> = scores
        .into_iter()
        .filter_map(|pair| {
            let mut result = slots.get_mut(pair.index)?.take()?;
            result.score = pair.score;
            result.source = SearchSource::Reranked;
            Some(result)
        })
        .take(n)
        .collect();
    assign_ranks(&mut results);
    results
}

/// Cross-encoder reranker when enabled and loadable, pass-through otherwise
pub fn select_reranker(enabled: bool) -> Arc<dyn Reranker> {
    if !enabled {
        return Arc::new(PassthroughReranker);
    }

    match CrossEncoderService::new() {
        Ok(service) => {
            info!("Loaded cross-encoder reranker");
            Arc::new(CrossEncoderReranker::new(service))
        }
        Err(e) => {
            warn!("Cross-encoder unavailable, reranking disabled: {e}");
            Arc::new(PassthroughReranker)
        }
    }
}
