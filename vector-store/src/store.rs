use crate::document::Document;
use crate::error::{Result, VectorStoreError};
use crate::record::VectorRecord;
use futures::future::join_all;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use vaultrag_embeddings::Embedder;

/// Configuration for the vector store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Expected embedding dimension; taken from the embedder when unset
    #[serde(default)]
    pub embedding_dim: Option<usize>,
}

/// A search hit from the vector store
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The document that was found
    pub document: Document,

    /// Cosine similarity (higher is better)
    pub score: f32,

    /// `1 - score` (lower is better)
    pub distance: f32,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    document: Document,
    vector: Option<Vec<f32>>,
}

/// In-memory cosine-similarity store keyed by document path.
///
/// Adding a document whose path is already stored replaces it. When opened
/// with a snapshot path, every mutation rewrites the JSON snapshot.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    config: VectorStoreConfig,
    entries: Arc<RwLock<IndexMap<String, StoredDocument>>>,
    db_path: Option<PathBuf>,
}

impl VectorStore {
    /// Create a store that is never persisted
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(embedder, VectorStoreConfig::default())
    }

    pub fn with_config(embedder: Arc<dyn Embedder>, mut config: VectorStoreConfig) -> Self {
        if config.embedding_dim.is_none() {
            config.embedding_dim = embedder.dimension();
        }
        Self {
            embedder,
            config,
            entries: Arc::new(RwLock::new(IndexMap::new())),
            db_path: None,
        }
    }

    /// Open a store backed by a JSON snapshot, loading it when present
    pub async fn open(db_path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        info!("Opening vector store at {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entries = if tokio::fs::try_exists(db_path).await? {
            match Self::load_from_disk(db_path).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Could not load existing data: {e}, starting fresh");
                    IndexMap::new()
                }
            }
        } else {
            IndexMap::new()
        };

        debug!("Loaded {} documents", entries.len());
        let mut store = Self::with_config(embedder, VectorStoreConfig::default());
        store.entries = Arc::new(RwLock::new(entries));
        store.db_path = Some(db_path.to_path_buf());
        Ok(store)
    }

    async fn load_from_disk(path: &Path) -> Result<IndexMap<String, StoredDocument>> {
        let content = tokio::fs::read(path).await?;
        let records: Vec<VectorRecord> = serde_json::from_slice(&content)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let (document, vector) = record.into_document();
                (document.path.clone(), StoredDocument { document, vector })
            })
            .collect())
    }

    /// Write the snapshot to the backing file
    pub async fn save(&self) -> Result<()> {
        let path = self.db_path.as_ref().ok_or(VectorStoreError::NoSnapshotPath)?;
        let content = serde_json::to_vec_pretty(&self.records().await)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Snapshot of every entry in the persisted record format
    pub async fn records(&self) -> Vec<VectorRecord> {
        let entries = self.entries.read().await;
        entries
            .values()
            .map(|stored| VectorRecord::from_document(&stored.document, stored.vector.clone()))
            .collect()
    }

    /// Embed and upsert documents, returning how many received a vector.
    ///
    /// A document whose embedding fails is still stored, without a vector, so
    /// it stays retrievable by path but never matches a similarity search.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        info!("Adding {} documents to vector store", documents.len());

        let embedder = &self.embedder;
        let vectors = join_all(documents.iter().map(|doc| embedder.embed(&doc.content))).await;

        let mut embedded = 0;
        let mut entries = self.entries.write().await;
        for (document, vector) in documents.into_iter().zip(vectors) {
            let vector = match vector {
                Ok(v) if !v.is_empty() => {
                    embedded += 1;
                    Some(v)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!("Storing {} without embedding: {e}", document.path);
                    None
                }
            };
            entries.insert(document.path.clone(), StoredDocument { document, vector });
        }
        drop(entries);

        if self.db_path.is_some() {
            self.save().await?;
        }

        debug!("Embedded {embedded} documents");
        Ok(embedded)
    }

    /// Search for documents similar to `query`
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(VectorStoreError::InvalidQuery("empty query".to_string()));
        }
        debug!("Searching for: '{query}' (limit: {limit})");

        let query_embedding = self.embedder.embed(query).await?;
        let actual = query_embedding.len();
        if let Some(expected) = self.config.embedding_dim.filter(|&dim| dim != actual) {
            return Err(VectorStoreError::DimensionMismatch { expected, actual });
        }

        let entries = self.entries.read().await;
        let mut hits: Vec<SearchHit> = entries
            .values()
            .filter_map(|stored| {
                let vector = stored.vector.as_ref()?;
                if vector.len() != query_embedding.len() {
                    return None;
                }
                let score = cosine_similarity(&query_embedding, vector);
                Some(SearchHit {
                    document: stored.document.clone(),
                    score,
                    distance: 1.0 - score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document.path.cmp(&b.document.path))
        });
        hits.truncate(limit);

        debug!("Found {} results", hits.len());
        Ok(hits)
    }

    pub async fn get(&self, path: &str) -> Option<Document> {
        let entries = self.entries.read().await;
        entries.get(path).map(|stored| stored.document.clone())
    }

    /// Remove a document, returning it when present
    pub async fn remove(&self, path: &str) -> Result<Option<Document>> {
        let removed = self.entries.write().await.shift_remove(path);
        if removed.is_some() && self.db_path.is_some() {
            self.save().await?;
        }
        Ok(removed.map(|stored| stored.document))
    }

    pub async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        if self.db_path.is_some() {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
