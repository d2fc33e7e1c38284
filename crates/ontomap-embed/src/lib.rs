//! Ontomap Embedding Service
//!
//! Pure Rust sentence embeddings for biomedical outcome terms using Candle.
//! Models are pulled from the Hugging Face Hub on first use and cached.
//!
//! # Features
//! - A fixed set of BERT checkpoints (SapBERT, S-PubMedBert, BioSimCSE, MiniLM)
//! - GPU support (CUDA, Metal) with automatic fallback to CPU
//! - Batched inference and an LRU cache for terms that recur across drugs
//! - The [`TextEmbedder`] trait so callers can swap in a stub
//!
//! # Example
//! ```rust,no_run
//! use ontomap_embed::{BertEmbedder, EmbeddingConfig, TextEmbedder};
//!
//! #[tokio::main]
//! async fn main() -> ontomap_embed::Result<()> {
//!     let embedder = BertEmbedder::new(EmbeddingConfig::cpu()).await?;
//!
//!     let terms = vec!["Headache".to_string(), "Cleft palate".to_string()];
//!     let vectors = embedder.embed(&terms).await?;
//!     println!("dimension: {}", vectors[0].len());
//!
//!     Ok(())
//! }
//! ```

mod cache;
pub mod config;
pub mod embedder;
pub mod error;
pub mod model;
pub mod pooling;
pub mod provider;
mod tokenizer;

pub use config::EmbeddingConfig;
pub use embedder::BertEmbedder;
pub use error::{EmbedError, Result};
pub use model::EmbeddingModel;
pub use pooling::PoolingStrategy;
pub use provider::TextEmbedder;
