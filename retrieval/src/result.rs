use serde::{Deserialize, Serialize};
use vaultrag_vector_store::Document;

/// Source of a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchSource {
    /// From vector similarity search
    Vector,
    /// From keyword search
    Keyword,
    /// From hybrid fusion
    Hybrid,
    /// Pulled in through the link graph
    Graph,
    /// Rescored by a reranker
    Reranked,
}

/// A single search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The document found
    pub document: Document,

    /// Relevance score, meaningful only within the list it came from
    pub score: f32,

    /// Source of this result
    pub source: SearchSource,

    /// Rank in the result list (0 = best)
    pub rank: usize,
}

impl SearchResult {
    /// Create new search result
    pub fn new(document: Document, score: f32, source: SearchSource) -> Self {
        Self {
            document,
            score,
            source,
            rank: 0,
        }
    }

    /// Set rank
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn path(&self) -> &str {
        &self.document.path
    }
}

/// Rewrite ranks to match list positions
pub fn assign_ranks(results: &mut [SearchResult]) {
    for (rank, result) in results.iter_mut().enumerate() {
        result.rank = rank;
    }
}

/// Collection of search results with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that produced these results
    pub query: String,

    /// Strategy that produced these results
    pub strategy: String,

    /// Search results
    pub results: Vec<SearchResult>,

    /// Total number of candidates before fusion and truncation
    pub total_candidates: usize,

    /// Search statistics
    pub stats: SearchStats,
}

/// Search statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total search time in milliseconds
    pub total_time_ms: u64,

    /// Vector search time in milliseconds
    pub vector_time_ms: u64,

    /// Keyword search time in milliseconds
    pub keyword_time_ms: u64,

    /// Graph expansion time in milliseconds
    pub graph_time_ms: u64,

    /// Reranking time in milliseconds
    pub rerank_time_ms: u64,

    /// Number of vector candidates
    pub vector_count: usize,

    /// Number of keyword candidates
    pub keyword_count: usize,

    /// Reranker rescored the candidates
    pub reranked: bool,

    /// Graph expansion added candidates
    pub graph_expanded: bool,

    /// Cache hit
    pub cache_hit: bool,
}

impl SearchResults {
    /// Create new search results
    pub fn new(query: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            strategy: strategy.into(),
            results: Vec::new(),
            total_candidates: 0,
            stats: SearchStats::default(),
        }
    }

    /// Add results
    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    /// Set total candidates
    pub fn with_total_candidates(mut self, count: usize) -> Self {
        self.total_candidates = count;
        self
    }

    /// Set stats
    pub fn with_stats(mut self, stats: SearchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Get top N results
    pub fn top(&self, n: usize) -> &[SearchResult] {
        &self.results[..n.min(self.results.len())]
    }

    /// Mean score of the returned results, 0.0 when empty
    pub fn average_score(&self) -> f32 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.score).sum::<f32>() / self.results.len() as f32
    }

    pub fn paths(&self) -> Vec<&str> {
        self.results.iter().map(SearchResult::path).collect()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_document(path: &str) -> Document {
        Document::new(path, "Some note text.")
    }

    #[test]
    fn test_search_result_creation() {
        let result = SearchResult::new(create_test_document("a.md"), 0.95, SearchSource::Vector);

        assert_eq!(result.score, 0.95);
        assert_eq!(result.source, SearchSource::Vector);
        assert_eq!(result.rank, 0);
        assert_eq!(result.path(), "a.md");
    }

    #[test]
    fn test_assign_ranks() {
        let mut results = vec![
            SearchResult::new(create_test_document("a.md"), 0.9, SearchSource::Hybrid).with_rank(7),
            SearchResult::new(create_test_document("b.md"), 0.8, SearchSource::Hybrid).with_rank(3),
        ];
        assign_ranks(&mut results);

        let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![0, 1]);
    }

    #[test]
    fn test_search_results_top_and_average() {
        let results = SearchResults::new("query", "hybrid").with_results(vec![
            SearchResult::new(create_test_document("a.md"), 0.9, SearchSource::Hybrid),
            SearchResult::new(create_test_document("b.md"), 0.6, SearchSource::Hybrid),
            SearchResult::new(create_test_document("c.md"), 0.3, SearchSource::Hybrid),
        ]);

        assert_eq!(results.top(2).len(), 2);
        assert_eq!(results.top(5).len(), 3);
        assert_eq!(results.paths(), vec!["a.md", "b.md", "c.md"]);
        assert!((results.average_score() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_empty_results() {
        let results = SearchResults::new("nothing", "vector");
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert_eq!(results.average_score(), 0.0);
    }

    #[test]
    fn test_source_names() {
        assert_eq!(SearchSource::Reranked.to_string(), "reranked");
        assert_eq!(serde_json::to_string(&SearchSource::Graph).unwrap(), "\"graph\"");
    }
}
