//! # Vault-RAG Embeddings
//!
//! Text embedding and pairwise relevance scoring for knowledge-base retrieval.
//!
//! ## Backends
//!
//! - [`LocalEmbedder`]: on-device ONNX model via fastembed-rs
//! - [`OllamaEmbedder`]: HTTP embedding endpoint of a local Ollama server
//! - [`CrossEncoderService`]: on-device cross-encoder for reranking
//!
//! All embedders implement [`Embedder`]. Batch embedding tolerates per-text
//! failures: failed texts are dropped, so a batch result may be shorter than
//! its input.
//!
//! ## Example
//!
//! ```no_run
//! use vaultrag_embeddings::{Embedder, OllamaEmbedder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = OllamaEmbedder::from_env()?;
//!     let texts = vec!["[[Zettelkasten]] links notes together".to_string()];
//!     let embeddings = embedder.embed_batch(&texts).await;
//!     println!("Generated {} embeddings", embeddings.len());
//!     Ok(())
//! }
//! ```

mod cross_encoder;
mod embedder;
mod error;
mod ollama;
mod service;

pub use cross_encoder::{CrossEncoderModel, CrossEncoderService, PairScore};
pub use embedder::Embedder;
pub use error::EmbeddingError;
pub use ollama::{OllamaConfig, OllamaEmbedder};
pub use service::{EmbeddingConfig, EmbeddingModelType, LocalEmbedder};

/// Default embedding dimension for Nomic-embed-text-v1.5
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Compact embedding dimension (using Matryoshka truncation)
pub const COMPACT_EMBEDDING_DIM: usize = 256;
