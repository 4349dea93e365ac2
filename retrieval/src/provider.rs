use crate::result::{SearchResult, SearchSource, assign_ranks};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use vaultrag_vector_store::Document;

/// Read access to a document corpus keyed by path
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Every known path, in a stable order
    async fn list_paths(&self) -> Vec<String>;

    /// `None` when the path is unknown, which is distinct from an empty document
    async fn get_document(&self, path: &str) -> Option<Document>;

    /// Case-insensitive substring search scored by occurrence count
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}

/// In-memory corpus preserving insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    documents: IndexMap<String, Document>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut vault = Self::new();
        for document in documents {
            vault.insert(document);
        }
        vault
    }

    /// Insert or replace a document, returning the previous version
    pub fn insert(&mut self, document: Document) -> Option<Document> {
        self.documents.insert(document.path.clone(), document)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentProvider for MemoryVault {
    async fn list_paths(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    async fn get_document(&self, path: &str) -> Option<Document> {
        self.documents.get(path).cloned()
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .documents
            .values()
            .filter_map(|document| {
                let occurrences = document.content.to_lowercase().matches(&needle).count();
                (occurrences > 0).then(|| {
                    SearchResult::new(document.clone(), occurrences as f32, SearchSource::Keyword)
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        assign_ranks(&mut results);

        debug!("Vault search for '{query}' matched {} documents", results.len());
        results
    }
}
