//! Errors raised while fetching, loading or running an embedding model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedError>;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Unsupported embedding model: {0}")]
    UnsupportedModel(String),

    /// A file could not be fetched from the Hugging Face Hub or its cache.
    #[error("Failed to download {file} from {repo}: {reason}")]
    Download {
        repo: String,
        file: &'static str,
        reason: String,
    },

    #[error("Failed to load {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),

    /// The model produced a different number of vectors than inputs given.
    #[error("{model} returned {found} vectors for {expected} inputs")]
    CountMismatch {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model config: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<candle_core::Error> for EmbedError {
    fn from(e: candle_core::Error) -> Self {
        EmbedError::Inference(e.to_string())
    }
}

impl From<tokenizers::Error> for EmbedError {
    fn from(e: tokenizers::Error) -> Self {
        EmbedError::Tokenizer(e.to_string())
    }
}
