/*!
# Vault-RAG Retrieval

Hybrid retrieval and graph-augmented ranking over a linked document corpus:
- **Vector search** via the embedding-backed [`VectorStore`](vaultrag_vector_store::VectorStore)
- **Keyword search** via BM25 ([`Bm25Index`]) or the provider's substring search
- **Weighted fusion** of max-normalized scores
- **Link-graph expansion** from top results via [`GraphIndex`]
- **Reranking** with a local cross-encoder, falling back to pass-through

## Architecture

```text
Query
  ├─> Vector source ──┐
  │     (2·top_k)     ├─> Weighted fusion ─> Rerank (> 3 candidates) ─> hybrid
  └─> Keyword source ─┘                                                   │
        (2·top_k)                                  graph / full: expand top seeds
                                                   through GraphIndex, union, sort
```

## Strategies

- `vector`: cosine similarity only
- `keyword`: keyword relevance only
- `hybrid`: `w·vector + (1 − w)·keyword`, each normalized by its batch maximum
- `graph`: hybrid, then BFS expansion of the top 3 seeds to `graph_depth`
- `full`: hybrid, then expansion of the top 2 seeds to depth 2

## Example

```rust,no_run
use std::sync::Arc;
use vaultrag_embeddings::OllamaEmbedder;
use vaultrag_retrieval::{Bm25Index, MemoryVault, RagConfig, RetrievalEngine, RetrievalStrategy};
use vaultrag_vector_store::{Document, VectorStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let documents = vec![
        Document::new("zettelkasten.md", "Atomic notes, densely linked.").with_links(["links"]),
        Document::new("links.md", "Links turn notes into a graph."),
    ];

    let vault = Arc::new(MemoryVault::from_documents(documents.clone()));
    let store = Arc::new(VectorStore::in_memory(Arc::new(OllamaEmbedder::from_env()?)));

    let engine = RetrievalEngine::new(RagConfig::default(), vault, store, Arc::new(Bm25Index::new()))?
        .with_default_reranker();
    engine.index_documents(&documents).await;

    let results = engine.retrieve("how do notes connect", RetrievalStrategy::Graph).await?;
    for result in results.top(5) {
        println!("{}. {} (score: {:.3})", result.rank + 1, result.path(), result.score);
    }

    Ok(())
}
```
*/

mod config;
mod error;
mod fusion;
mod graph;
mod keyword;
mod provider;
mod rerank;
mod result;
mod retrieval;
mod source;

pub use config::{MIN_CONTEXT_TOKENS, RagConfig, RetrievalStrategy};
pub use error::{Result, RetrievalError};
pub use fusion::{FusionEngine, sort_by_score_then_path, union_dedupe};
pub use graph::{GraphIndex, GraphStats, LinkGraph, PetLinkGraph};
pub use keyword::Bm25Index;
pub use provider::{DocumentProvider, MemoryVault};
pub use rerank::{CrossEncoderReranker, PassthroughReranker, RerankOutcome, Reranker, select_reranker};
pub use result::{SearchResult, SearchResults, SearchSource, SearchStats, assign_ranks};
pub use retrieval::{CacheStats, RetrievalEngine};
pub use source::{CandidateSource, VaultKeywordSource};
