//! Configuration for the embedding service.

use serde::{Deserialize, Serialize};

use crate::{EmbeddingModel, PoolingStrategy};

/// Configuration for the BERT embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Pretrained checkpoint to load
    pub model: EmbeddingModel,

    /// Maximum sequence length in tokens (default: 512)
    pub max_length: usize,

    /// Batch size for inference (default: 32)
    pub batch_size: usize,

    /// L2-normalize embeddings (default: false; cosine similarity is scale-free)
    pub normalize: bool,

    /// Overrides the model's own pooling strategy when set
    pub pooling: Option<PoolingStrategy>,

    /// Use GPU if available (default: false)
    pub use_gpu: bool,

    /// Cache directory for downloaded models
    pub cache_dir: Option<String>,

    /// Maximum cache size for embeddings (number of entries, 0 disables)
    pub cache_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::default(),
            max_length: 512,
            batch_size: 32,
            normalize: false,
            pooling: None,
            use_gpu: false,
            cache_dir: None,
            cache_size: 10_000,
        }
    }
}

impl EmbeddingConfig {
    /// Create config for CPU-only inference.
    pub fn cpu() -> Self {
        Self {
            use_gpu: false,
            ..Default::default()
        }
    }

    /// Use a different supported model.
    pub fn with_model(mut self, model: EmbeddingModel) -> Self {
        self.model = model;
        self
    }

    /// Pooling actually applied: the override, else the model's own.
    pub fn effective_pooling(&self) -> PoolingStrategy {
        self.pooling.unwrap_or_else(|| self.model.pooling())
    }
}
