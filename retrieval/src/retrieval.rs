use crate::config::{RagConfig, RetrievalStrategy};
use crate::error::{Result, RetrievalError};
use crate::fusion::{FusionEngine, union_dedupe};
use crate::graph::GraphIndex;
use crate::provider::DocumentProvider;
use crate::rerank::{PassthroughReranker, Reranker, select_reranker};
use crate::result::{SearchResult, SearchResults, SearchStats};
use crate::source::CandidateSource;
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use vaultrag_vector_store::Document;

/// Seeds expanded by the `graph` strategy
const GRAPH_SEEDS: usize = 3;
/// Seeds expanded by the `full` strategy
const FULL_SEEDS: usize = 2;
/// Fixed expansion depth of the `full` strategy
const FULL_DEPTH: usize = 2;

type CacheKey = (RetrievalStrategy, String);

/// Strategy dispatch over vector, keyword and graph retrieval
pub struct RetrievalEngine {
    config: RagConfig,
    vector_source: Arc<dyn CandidateSource>,
    keyword_source: Arc<dyn CandidateSource>,
    reranker: Arc<dyn Reranker>,
    fusion: FusionEngine,
    graph: GraphIndex,
    cache: Option<RwLock<LruCache<CacheKey, SearchResults>>>,
}

impl RetrievalEngine {
    /// Create an engine with pass-through reranking.
    ///
    /// Fails with [`RetrievalError::InvalidConfig`] when `config` does not
    /// validate.
    pub fn new(
        config: RagConfig,
        provider: Arc<dyn DocumentProvider>,
        vector_source: Arc<dyn CandidateSource>,
        keyword_source: Arc<dyn CandidateSource>,
    ) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        info!("Initializing retrieval engine");

        let cache = if config.enable_cache {
            let size = NonZeroUsize::new(config.cache_size).ok_or_else(|| {
                RetrievalError::InvalidConfig("cache_size must be > 0".to_string())
            })?;
            Some(RwLock::new(LruCache::new(size)))
        } else {
            None
        };

        Ok(Self {
            fusion: FusionEngine::new(config.vector_weight),
            config,
            vector_source,
            keyword_source,
            reranker: Arc::new(PassthroughReranker),
            graph: GraphIndex::new(provider),
            cache,
        })
    }

    /// Replace the reranker
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = reranker;
        self
    }

    /// Load the cross-encoder when `rerank` is enabled, falling back to pass-through
    pub fn with_default_reranker(self) -> Self {
        let reranker = select_reranker(self.config.rerank);
        self.with_reranker(reranker)
    }

    /// Retrieve with the configured default strategy
    pub async fn retrieve_default(&self, query: &str) -> Result<SearchResults> {
        self.retrieve(query, self.config.default_strategy()).await
    }

    /// Retrieve with a strategy given by name
    pub async fn retrieve_named(&self, query: &str, strategy: &str) -> Result<SearchResults> {
        let strategy = RetrievalStrategy::parse(strategy)?;
        self.retrieve(query, strategy).await
    }

    /// Retrieve at most `top_k` documents for `query`
    pub async fn retrieve(&self, query: &str, strategy: RetrievalStrategy) -> Result<SearchResults> {
        let start = Instant::now();
        debug!("{strategy} retrieval for: '{query}'");

        let key = (strategy, query.to_string());
        if let Some(cache) = &self.cache {
            let mut cache = cache.write().await;
            if let Some(cached) = cache.get(&key) {
                info!("Cache hit for query: '{query}'");
                let mut result = cached.clone();
                result.stats.cache_hit = true;
                result.stats.total_time_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
        }

        let mut stats = SearchStats::default();
        let top_k = self.config.top_k;

        let (results, total_candidates) = match strategy {
            RetrievalStrategy::Vector => {
                let results = self.vector_source.candidates(query, top_k).await;
                stats.vector_time_ms = start.elapsed().as_millis() as u64;
                stats.vector_count = results.len();
                (results, stats.vector_count)
            }
            RetrievalStrategy::Keyword => {
                let results = self.keyword_source.candidates(query, top_k).await;
                stats.keyword_time_ms = start.elapsed().as_millis() as u64;
                stats.keyword_count = results.len();
                (results, stats.keyword_count)
            }
            RetrievalStrategy::Hybrid => self.hybrid(query, &mut stats).await,
            RetrievalStrategy::Graph => {
                let (seeds, total) = self.hybrid(query, &mut stats).await;
                let depth = self.config.graph_depth;
                (self.expand(seeds, GRAPH_SEEDS, depth, &mut stats).await, total)
            }
            RetrievalStrategy::Full => {
                let (seeds, total) = self.hybrid(query, &mut stats).await;
                (self.expand(seeds, FULL_SEEDS, FULL_DEPTH, &mut stats).await, total)
            }
        };

        stats.total_time_ms = start.elapsed().as_millis() as u64;
        let results = SearchResults::new(query, strategy.to_string())
            .with_results(results)
            .with_total_candidates(total_candidates)
            .with_stats(stats);

        if let Some(cache) = &self.cache {
            cache.write().await.put(key, results.clone());
        }

        info!(
            "Search completed in {}ms, returned {} results",
            results.stats.total_time_ms,
            results.len()
        );

        Ok(results)
    }

    /// Fuse `2 * top_k` candidates from each source, then rerank or truncate
    async fn hybrid(&self, query: &str, stats: &mut SearchStats) -> (Vec<SearchResult>, usize) {
        let pool = self.config.top_k * 2;

        let vector_start = Instant::now();
        let vector_results = self.vector_source.candidates(query, pool).await;
        stats.vector_time_ms = vector_start.elapsed().as_millis() as u64;
        stats.vector_count = vector_results.len();

        let keyword_start = Instant::now();
        let keyword_results = self.keyword_source.candidates(query, pool).await;
        stats.keyword_time_ms = keyword_start.elapsed().as_millis() as u64;
        stats.keyword_count = keyword_results.len();

        let mut fused = self.fusion.fuse(vector_results, keyword_results);
        let total = fused.len();
        debug!("Fusion produced {total} results");

        if self.config.rerank && fused.len() > 3 {
            let rerank_start = Instant::now();
            let outcome = self.reranker.rerank(query, fused, self.config.top_k).await;
            stats.rerank_time_ms = rerank_start.elapsed().as_millis() as u64;
            stats.reranked = outcome.applied;
            return (outcome.results, total);
        }

        fused.truncate(self.config.top_k);
        (fused, total)
    }

    /// Expand the first `seed_count` seeds through the link graph and merge
    async fn expand(
        &self,
        seeds: Vec<SearchResult>,
        seed_count: usize,
        depth: usize,
        stats: &mut SearchStats,
    ) -> Vec<SearchResult> {
        if seeds.is_empty() {
            return seeds;
        }

        let graph_start = Instant::now();
        let mut lists = Vec::with_capacity(seed_count + 1);
        for seed in seeds.iter().take(seed_count) {
            lists.push(self.graph.expand_context(seed.path(), depth).await);
        }
        let seed_len = seeds.len();
        lists.insert(0, seeds);

        let mut merged = union_dedupe(lists);
        stats.graph_expanded = merged.len() > seed_len;
        stats.graph_time_ms = graph_start.elapsed().as_millis() as u64;
        debug!("Graph expansion merged {} results", merged.len());

        merged.truncate(self.config.top_k);
        merged
    }

    /// Make documents searchable by both sources and drop cached results
    pub async fn index_documents(&self, documents: &[Document]) {
        info!("Indexing {} documents", documents.len());
        self.vector_source.upsert(documents).await;
        self.keyword_source.upsert(documents).await;
        self.clear_cache().await;
    }

    /// Clear search cache
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().await.clear();
            debug!("Search cache cleared");
        }
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => {
                let cache = cache.read().await;
                CacheStats {
                    size: cache.len(),
                    capacity: cache.cap().get(),
                }
            }
            None => CacheStats::default(),
        }
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}
