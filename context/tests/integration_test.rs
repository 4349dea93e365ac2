use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;
use vaultrag_context::{RagPipeline, TRUNCATION_MARKER};
use vaultrag_embeddings::{Embedder, EmbeddingError};
use vaultrag_retrieval::{Bm25Index, MemoryVault, RagConfig, RetrievalEngine, RetrievalStrategy};
use vaultrag_vector_store::{Document, VectorStore};

/// One axis per topic word, plus a small constant so no vector is zero
struct TopicEmbedder;

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.to_lowercase();
        let axis = |word: &str| if text.contains(word) { 1.0 } else { 0.0 };
        Ok(vec![
            axis("rust"),
            axis("garden"),
            axis("notes"),
            axis("bread"),
            0.01,
        ])
    }
}

fn vault_documents() -> Vec<Document> {
    vec![
        Document::new("hub.md", "Knowledge garden index.")
            .with_links(["garden/seeds", "garden/trees"])
            .with_tags(["moc"]),
        Document::new(
            "garden/seeds.md",
            "Seeds sprout into notes about rust ownership.",
        )
        .with_links(["garden/trees"]),
        Document::new("garden/trees.md", "Trees grow from linked notes."),
        Document::new("rust.md", "Rust ownership and borrowing rules.")
            .with_links(["garden/seeds"])
            .with_tags(["lang"]),
        Document::new("cooking.md", "Bread needs flour, water and patience."),
    ]
}

async fn pipeline_with(config: RagConfig, store: VectorStore) -> RagPipeline {
    let documents = vault_documents();
    let vault = Arc::new(MemoryVault::from_documents(documents.clone()));
    let engine = RetrievalEngine::new(config, vault, Arc::new(store), Arc::new(Bm25Index::new()))
        .unwrap();
    engine.index_documents(&documents).await;
    RagPipeline::new(engine)
}

async fn pipeline(config: RagConfig) -> RagPipeline {
    pipeline_with(config, VectorStore::in_memory(Arc::new(TopicEmbedder))).await
}

#[tokio::test]
async fn test_every_strategy_returns_ranked_context() {
    let pipeline = pipeline(RagConfig::default()).await;

    for strategy in ["vector", "keyword", "hybrid", "graph", "full"] {
        let augmented = pipeline
            .augmented_query_named("rust ownership", strategy)
            .await
            .unwrap();

        assert_eq!(augmented.metrics.strategy, strategy);
        assert!(!augmented.documents.is_empty(), "{strategy} found nothing");
        assert!(augmented.documents.len() <= 5);
        assert_eq!(augmented.documents[0].path(), "rust.md", "{strategy}");
        assert!(augmented.context.starts_with("query rust ownership\n"));
    }
}

#[tokio::test]
async fn test_graph_strategy_reports_expansion() {
    let config = RagConfig {
        top_k: 2,
        ..Default::default()
    };
    let pipeline = pipeline(config).await;

    let augmented = pipeline
        .augmented_query("rust ownership", RetrievalStrategy::Graph)
        .await
        .unwrap();

    let paths: Vec<&str> = augmented.documents.iter().map(|r| r.path()).collect();
    // hub.md links to garden/seeds.md, a seed, so it enters as a backlink
    assert_eq!(paths, vec!["rust.md", "hub.md"]);
    assert!(augmented.metrics.graph_expanded);
    assert!(!augmented.metrics.reranked);
}

#[tokio::test]
async fn test_graph_index_sees_vault_links() {
    let pipeline = pipeline(RagConfig::default()).await;
    let graph = pipeline.engine().graph();

    assert_eq!(graph.backlinks("garden/trees.md").await.len(), 2);
    assert_eq!(
        graph.find_path("hub.md", "garden/trees.md").await,
        Some(vec!["hub.md".to_string(), "garden/trees.md".to_string()])
    );

    let stats = graph.stats().await;
    assert_eq!(stats.total_notes, 5);
    assert_eq!(stats.total_links, 4);
    assert_eq!(stats.connected_components, 2);
}

#[tokio::test]
async fn test_verbose_context_lists_documents() {
    let config = RagConfig {
        compact_format: false,
        top_k: 1,
        ..Default::default()
    };
    let pipeline = pipeline(config).await;

    let augmented = pipeline
        .augmented_query("bread", RetrievalStrategy::Hybrid)
        .await
        .unwrap();

    assert_eq!(
        augmented.context,
        "Query: bread\n\nRelevant Documents:\n\n\n[1] cooking.md (score: 1.0)\nBread needs flour, water and patience.\n"
    );
    assert!(!augmented.metrics.compact_format);
}

#[tokio::test]
async fn test_budget_caps_context() {
    let config = RagConfig {
        max_context_tokens: 12,
        ..Default::default()
    };
    let pipeline = pipeline(config).await;

    let augmented = pipeline
        .augmented_query("rust ownership", RetrievalStrategy::Hybrid)
        .await
        .unwrap();

    assert!(augmented.metrics.context_truncated);
    assert!(augmented.context.ends_with(TRUNCATION_MARKER));
    assert!(augmented.context.chars().count() <= 48);
    assert!(augmented.metrics.context_tokens <= 12);
}

#[tokio::test]
async fn test_repeat_query_is_cached_until_reindex() {
    let pipeline = pipeline(RagConfig::default()).await;

    let first = pipeline.augmented_query_default("garden").await.unwrap();
    let second = pipeline.augmented_query_default("garden").await.unwrap();
    assert!(!first.metrics.cache_hit);
    assert!(second.metrics.cache_hit);
    assert_eq!(pipeline.engine().cache_stats().await.size, 1);

    pipeline
        .engine()
        .index_documents(&[Document::new("new.md", "A fresh garden note.")])
        .await;
    assert_eq!(pipeline.engine().cache_stats().await.size, 0);

    let third = pipeline.augmented_query_default("garden").await.unwrap();
    assert!(!third.metrics.cache_hit);
}

#[tokio::test]
async fn test_persisted_store_serves_a_new_pipeline() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("vectors.json");

    let store = VectorStore::open(&db_path, Arc::new(TopicEmbedder)).await.unwrap();
    let first = pipeline_with(RagConfig::default(), store).await;
    let before = first
        .augmented_query("rust", RetrievalStrategy::Vector)
        .await
        .unwrap();

    let reopened = VectorStore::open(&db_path, Arc::new(TopicEmbedder)).await.unwrap();
    assert_eq!(reopened.count().await, 5);

    let vault = Arc::new(MemoryVault::from_documents(vault_documents()));
    let engine = RetrievalEngine::new(
        RagConfig::default(),
        vault,
        Arc::new(reopened),
        Arc::new(Bm25Index::new()),
    )
    .unwrap();
    let after = RagPipeline::new(engine)
        .augmented_query("rust", RetrievalStrategy::Vector)
        .await
        .unwrap();

    assert_eq!(before.context, after.context);
}
