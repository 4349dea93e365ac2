//! # Vault-RAG Vector Store
//!
//! Document model and cosine-similarity storage for knowledge-base retrieval.
//!
//! Documents are keyed by path: adding a document whose path is already
//! stored replaces the old entry. Stores opened with [`VectorStore::open`]
//! persist a JSON array of [`VectorRecord`]s after every mutation.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vaultrag_embeddings::OllamaEmbedder;
//! use vaultrag_vector_store::{Document, VectorStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = Arc::new(OllamaEmbedder::from_env()?);
//!     let store = VectorStore::open(Path::new(".vault/vectors.json"), embedder).await?;
//!
//!     store
//!         .add_documents(vec![Document::new("ideas/graphs.md", "Notes link to notes.")])
//!         .await?;
//!
//!     let hits = store.search("linked notes", 5).await?;
//!     println!("Found {} similar notes", hits.len());
//!     Ok(())
//! }
//! ```

mod document;
mod error;
mod record;
mod store;

pub use document::{Document, DocumentMetadata};
pub use error::{Result, VectorStoreError};
pub use record::VectorRecord;
pub use store::{SearchHit, VectorStore, VectorStoreConfig};
