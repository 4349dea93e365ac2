use crate::provider::DocumentProvider;
use crate::result::{SearchResult, SearchSource, assign_ranks};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use vaultrag_vector_store::{Document, VectorStore};

/// Something that turns a query into a scored candidate list.
///
/// Scores are local to one call; callers normalize before combining lists.
/// Failures degrade to an empty list.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn source(&self) -> SearchSource;

    async fn candidates(&self, query: &str, limit: usize) -> Vec<SearchResult>;

    /// Make documents searchable; sources backed by external data ignore this
    async fn upsert(&self, _documents: &[Document]) {}
}

#[async_trait]
impl CandidateSource for VectorStore {
    fn source(&self) -> SearchSource {
        SearchSource::Vector
    }

    async fn candidates(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        match self.search(query, limit).await {
            Ok(hits) => hits
                .into_iter()
                .enumerate()
                .map(|(rank, hit)| {
                    SearchResult::new(hit.document, 1.0 - hit.distance, SearchSource::Vector)
                        .with_rank(rank)
                })
                .collect(),
            Err(e) => {
                warn!("Vector search failed for '{query}': {e}");
                Vec::new()
            }
        }
    }

    async fn upsert(&self, documents: &[Document]) {
        if let Err(e) = self.add_documents(documents.to_vec()).await {
            warn!("Failed to index {} documents: {e}", documents.len());
        }
    }
}

/// Keyword candidates from the provider's own substring search
pub struct VaultKeywordSource {
    provider: Arc<dyn DocumentProvider>,
}

impl VaultKeywordSource {
    pub fn new(provider: Arc<dyn DocumentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CandidateSource for VaultKeywordSource {
    fn source(&self) -> SearchSource {
        SearchSource::Keyword
    }

    async fn candidates(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let mut results = self.provider.search(query).await;
        results.truncate(limit);
        assign_ranks(&mut results);
        results
    }
}
