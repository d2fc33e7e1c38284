use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntomapError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column '{column}' not found in {} (columns: {available:?})", .path.display())]
    MissingColumn {
        column: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("Embedding dimension mismatch: expected {expected}, found {found} ({context})")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        context: String,
    },

    #[error("Malformed similarity matrix in {}: {reason}", .path.display())]
    MalformedMatrix { path: PathBuf, reason: String },

    #[error("Embedding error: {0}")]
    Embedding(#[from] ontomap_embed::EmbedError),

    #[error("Configuration error: {0}")]
    Config(#[from] ontomap_config::ConfigError),
}

impl OntomapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OntomapError::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        OntomapError::Csv { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, OntomapError>;
