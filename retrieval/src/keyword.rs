//! Okapi BM25 keyword index.

use crate::result::{SearchResult, SearchSource, assign_ranks};
use crate::source::CandidateSource;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::collections::HashSet;
use tokio::sync::RwLock;
use vaultrag_vector_store::Document;

const DEFAULT_K1: f32 = 1.2;
const DEFAULT_B: f32 = 0.75;

#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    term_freqs: HashMap<String, usize>,
    length: usize,
}

#[derive(Debug, Default)]
struct Bm25State {
    documents: IndexMap<String, IndexedDocument>,
    doc_freqs: HashMap<String, usize>,
    total_length: usize,
}

impl Bm25State {
    fn remove(&mut self, path: &str) {
        let Some(old) = self.documents.shift_remove(path) else {
            return;
        };
        self.total_length -= old.length;
        for term in old.term_freqs.keys() {
            if let Some(count) = self.doc_freqs.get_mut(term) {
                *count -= 1;
                if *count == 0 {
                    self.doc_freqs.remove(term);
                }
            }
        }
    }

    fn insert(&mut self, document: Document) {
        self.remove(&document.path);

        let tokens = tokenize(&document.content);
        let mut term_freqs: HashMap<String, usize> = HashMap::new();
        for token in &tokens {
            *term_freqs.entry(token.clone()).or_default() += 1;
        }
        for term in term_freqs.keys() {
            *self.doc_freqs.entry(term.clone()).or_default() += 1;
        }
        self.total_length += tokens.len();

        self.documents.insert(
            document.path.clone(),
            IndexedDocument {
                document,
                term_freqs,
                length: tokens.len(),
            },
        );
    }

    fn average_length(&self) -> f32 {
        if self.documents.is_empty() {
            0.0
        } else {
            self.total_length as f32 / self.documents.len() as f32
        }
    }
}

/// BM25 index over document content, upserted by path
#[derive(Debug)]
pub struct Bm25Index {
    k1: f32,
    b: f32,
    state: RwLock<Bm25State>,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Index {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_K1, DEFAULT_B)
    }

    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            k1,
            b,
            state: RwLock::new(Bm25State::default()),
        }
    }

    /// Index documents, replacing any already indexed under the same path
    pub async fn add_documents(&self, documents: impl IntoIterator<Item = Document>) {
        let mut state = self.state.write().await;
        for document in documents {
            state.insert(document);
        }
        debug!("BM25 index holds {} documents", state.documents.len());
    }

    pub async fn remove(&self, path: &str) {
        self.state.write().await.remove(path);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }

    /// Score every document against `query`; only positive scores are returned
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let state = self.state.read().await;
        let total_docs = state.documents.len() as f32;
        let avg_length = state.average_length();

        let idf: HashMap<&str, f32> = terms
            .iter()
            .filter_map(|term| {
                let n = *state.doc_freqs.get(term)? as f32;
                Some((term.as_str(), (1.0 + (total_docs - n + 0.5) / (n + 0.5)).ln()))
            })
            .collect();
        if idf.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = state
            .documents
            .values()
            .filter_map(|indexed| {
                let length_norm = if avg_length > 0.0 {
                    1.0 - self.b + self.b * indexed.length as f32 / avg_length
                } else {
                    1.0
                };
                let score: f32 = idf
                    .iter()
                    .filter_map(|(term, idf)| {
                        let tf = *indexed.term_freqs.get(*term)? as f32;
                        Some(idf * tf * (self.k1 + 1.0) / (tf + self.k1 * length_norm))
                    })
                    .sum();
                (score > 0.0).then(|| {
                    SearchResult::new(indexed.document.clone(), score, SearchSource::Keyword)
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path().cmp(b.path()))
        });
        results.truncate(limit);
        assign_ranks(&mut results);
        results
    }
}

#[async_trait]
impl CandidateSource for Bm25Index {
    fn source(&self) -> SearchSource {
        SearchSource::Keyword
    }

    async fn candidates(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.search(query, limit).await
    }

    async fn upsert(&self, documents: &[Document]) {
        self.add_documents(documents.iter().cloned()).await;
    }
}

/// Lowercased alphanumeric runs
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn index() -> Bm25Index {
        let index = Bm25Index::new();
        index
            .add_documents([
                Document::new("rust.md", "Rust ownership and borrowing rules."),
                Document::new("graphs.md", "Graphs connect notes. Graphs have edges."),
                Document::new("mixed.md", "Rust crates for graphs."),
            ])
            .await;
        index
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Hello, [[World]]! it's 2024"),
            vec!["hello", "world", "it", "s", "2024"]
        );
    }

    #[tokio::test]
    async fn test_term_frequency_ranks_higher() {
        let results = index().await.search("graphs", 10).await;
        let paths: Vec<&str> = results.iter().map(SearchResult::path).collect();

        assert_eq!(paths, vec!["graphs.md", "mixed.md"]);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[1].rank, 1);
    }

    #[tokio::test]
    async fn test_unknown_terms_match_nothing() {
        let index = index().await;
        assert!(index.search("haskell", 10).await.is_empty());
        assert!(index.search("  ", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_terms() {
        let index = index().await;
        index
            .add_documents([Document::new("rust.md", "Now about gardening.")])
            .await;

        assert_eq!(index.len().await, 3);
        let paths: Vec<String> = index
            .search("ownership", 10)
            .await
            .into_iter()
            .map(|r| r.document.path)
            .collect();
        assert!(paths.is_empty());

        let gardening = index.search("gardening", 10).await;
        assert_eq!(gardening.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_limit() {
        let index = index().await;
        assert_eq!(index.search("rust graphs", 1).await.len(), 1);

        index.remove("mixed.md").await;
        index.remove("missing.md").await;
        assert_eq!(index.len().await, 2);
        assert!(!index.is_empty().await);
    }
}
