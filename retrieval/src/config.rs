use crate::error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest token budget whose `budget * 4` characters can hold the
/// context truncation marker
pub const MIN_CONTEXT_TOKENS: usize = 4;

/// Retrieval strategy, parsed from its lowercase name
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Vector similarity only
    Vector,
    /// Keyword relevance only
    Keyword,
    /// Weighted fusion of vector and keyword scores
    Hybrid,
    /// Hybrid seeds expanded through the link graph
    Graph,
    /// Hybrid seeds expanded two hops regardless of `graph_depth`
    Full,
}

impl RetrievalStrategy {
    /// Parse a strategy name, failing on anything unknown
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| RetrievalError::UnknownStrategy(name.to_string()))
    }
}

/// Configuration for retrieval and context assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Number of documents to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// BFS depth for the `graph` strategy
    #[serde(default = "default_graph_depth")]
    pub graph_depth: usize,

    /// Use `hybrid` rather than `vector` as the default strategy
    #[serde(default = "default_true")]
    pub use_hybrid_search: bool,

    /// Weight of vector scores in hybrid fusion (0.0 - 1.0)
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// Render context in the compact format instead of verbose text
    #[serde(default = "default_true", alias = "use_toon")]
    pub compact_format: bool,

    /// Rerank hybrid candidates before truncation
    #[serde(default = "default_true")]
    pub rerank: bool,

    /// Token budget of the assembled context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Include tags and links in each context record
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Per-document character cap before sentence-aware truncation
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Enable caching of retrieval results
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of queries to cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_graph_depth() -> usize {
    2
}

fn default_vector_weight() -> f32 {
    0.6
}

fn default_max_context_tokens() -> usize {
    4000
}

fn default_max_content_chars() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_cache_size() -> usize {
    100
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            graph_depth: default_graph_depth(),
            use_hybrid_search: true,
            vector_weight: default_vector_weight(),
            compact_format: true,
            rerank: true,
            max_context_tokens: default_max_context_tokens(),
            include_metadata: true,
            max_content_chars: default_max_content_chars(),
            enable_cache: true,
            cache_size: default_cache_size(),
        }
    }
}

impl RagConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.vector_weight) {
            return Err(format!(
                "vector_weight must be in [0.0, 1.0], got {}",
                self.vector_weight
            ));
        }

        if self.top_k == 0 {
            return Err("top_k must be > 0".to_string());
        }

        if self.max_context_tokens < MIN_CONTEXT_TOKENS {
            return Err(format!(
                "max_context_tokens must be >= {MIN_CONTEXT_TOKENS}, got {}",
                self.max_context_tokens
            ));
        }

        if self.max_content_chars == 0 {
            return Err("max_content_chars must be > 0".to_string());
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err("cache_size must be > 0 when caching is enabled".to_string());
        }

        Ok(())
    }

    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate().map_err(RetrievalError::InvalidConfig)?;
        Ok(config)
    }

    /// Parse and validate a JSON document; missing keys take defaults
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate().map_err(RetrievalError::InvalidConfig)?;
        Ok(config)
    }

    /// Strategy used when the caller does not name one
    pub fn default_strategy(&self) -> RetrievalStrategy {
        if self.use_hybrid_search {
            RetrievalStrategy::Hybrid
        } else {
            RetrievalStrategy::Vector
        }
    }

    /// Fewer documents, vector-leaning, shallow graph
    pub fn precise() -> Self {
        Self {
            top_k: 3,
            graph_depth: 1,
            vector_weight: 0.8,
            ..Default::default()
        }
    }

    /// More documents, keyword-leaning, deeper graph
    pub fn exploratory() -> Self {
        Self {
            top_k: 10,
            graph_depth: 3,
            vector_weight: 0.4,
            max_context_tokens: 8000,
            ..Default::default()
        }
    }
}
