/*!
# Vault-RAG Context

Turns ranked retrieval results into a token-budgeted context block for a
text generator.

## Pipeline

```text
Query
  └─> RetrievalEngine (vector / keyword / hybrid / graph / full)
        └─> Per-document truncation (sentence-aware, max_content_chars)
              └─> Verbose text or compact serialization
                    └─> Token budget (chars / 4, hard cut + marker)
                          └─> (context, documents, metrics)
```

## Example

```rust,no_run
use std::sync::Arc;
use vaultrag_context::RagPipeline;
use vaultrag_embeddings::OllamaEmbedder;
use vaultrag_retrieval::{Bm25Index, MemoryVault, RagConfig, RetrievalEngine, RetrievalStrategy};
use vaultrag_vector_store::{Document, VectorStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let documents = vec![Document::new("inbox.md", "Process the inbox weekly.")];
    let vault = Arc::new(MemoryVault::from_documents(documents.clone()));
    let store = Arc::new(VectorStore::in_memory(Arc::new(OllamaEmbedder::from_env()?)));

    let engine = RetrievalEngine::new(RagConfig::default(), vault, store, Arc::new(Bm25Index::new()))?;
    engine.index_documents(&documents).await;

    let pipeline = RagPipeline::new(engine);
    let augmented = pipeline.augmented_query("weekly review", RetrievalStrategy::Hybrid).await?;

    println!("{}", augmented.context);
    println!("~{} tokens", augmented.metrics.context_tokens);
    Ok(())
}
```
*/

mod assembler;
pub mod compact;
mod error;
mod pipeline;

pub use assembler::{
    AssembledContext, ContextAssembler, TRUNCATION_MARKER, estimate_tokens, truncate_content,
};
pub use error::{ContextError, Result};
pub use pipeline::{AugmentedContext, ContextMetrics, RagPipeline};
