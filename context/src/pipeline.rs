use crate::assembler::{AssembledContext, ContextAssembler};
use crate::error::Result;
use log::info;
use serde::{Deserialize, Serialize};
use vaultrag_retrieval::{RetrievalEngine, RetrievalStrategy, SearchResult, SearchResults};

/// Figures describing one augmented query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMetrics {
    pub num_documents: usize,
    pub avg_score: f32,
    pub context_tokens: usize,
    pub strategy: String,
    pub retrieval_time_ms: u64,
    pub compact_format: bool,
    pub reranked: bool,
    pub graph_expanded: bool,
    pub cache_hit: bool,
    pub context_truncated: bool,
}

/// Everything a generator needs to answer `query`
#[derive(Debug, Clone)]
pub struct AugmentedContext {
    pub query: String,
    pub context: String,
    pub documents: Vec<SearchResult>,
    pub metrics: ContextMetrics,
}

/// Retrieval followed by context assembly
pub struct RagPipeline {
    engine: RetrievalEngine,
    assembler: ContextAssembler,
}

impl RagPipeline {
    pub fn new(engine: RetrievalEngine) -> Self {
        let assembler = ContextAssembler::new(engine.config());
        Self { engine, assembler }
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    /// Render already-ranked documents
    pub fn build_context(&self, query: &str, documents: &[SearchResult]) -> Result<AssembledContext> {
        self.assembler.assemble(query, documents)
    }

    /// Retrieve, assemble and measure in one call
    pub async fn augmented_query(
        &self,
        query: &str,
        strategy: RetrievalStrategy,
    ) -> Result<AugmentedContext> {
        let results = self.engine.retrieve(query, strategy).await?;
        self.finish(results)
    }

    /// Like [`Self::augmented_query`] with the strategy given by name
    pub async fn augmented_query_named(&self, query: &str, strategy: &str) -> Result<AugmentedContext> {
        let strategy = RetrievalStrategy::parse(strategy)?;
        self.augmented_query(query, strategy).await
    }

    /// Use the configured default strategy
    pub async fn augmented_query_default(&self, query: &str) -> Result<AugmentedContext> {
        self.augmented_query(query, self.engine.config().default_strategy())
            .await
    }

    fn finish(&self, results: SearchResults) -> Result<AugmentedContext> {
        let assembled = self.assembler.assemble(&results.query, &results.results)?;

        let metrics = ContextMetrics {
            num_documents: results.len(),
            avg_score: results.average_score(),
            context_tokens: assembled.estimated_tokens,
            strategy: results.strategy.clone(),
            retrieval_time_ms: results.stats.total_time_ms,
            compact_format: self.engine.config().compact_format,
            reranked: results.stats.reranked,
            graph_expanded: results.stats.graph_expanded,
            cache_hit: results.stats.cache_hit,
            context_truncated: assembled.truncated,
        };

        info!(
            "Augmented '{}' with {} documents (~{} tokens)",
            results.query, metrics.num_documents, metrics.context_tokens
        );

        Ok(AugmentedContext {
            query: results.query,
            context: assembled.text,
            documents: results.results,
            metrics,
        })
    }
}
