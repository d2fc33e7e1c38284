//! Configuration loading for the ontology-mapping job.
//!
//! Reads `ontomap.toml` from the current directory or the path in the
//! `ONTOMAP_CONFIG` env var. `config.env` is loaded first (if present) so the
//! `interimdatadir` variable can supply the base directory.

use std::path::{Path, PathBuf};

use ontomap_embed::{EmbeddingConfig, EmbeddingModel};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_ENV_VAR: &str = "ONTOMAP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ontomap.toml";
pub const DOTENV_FILE: &str = "config.env";
pub const BASE_DIR_ENV_VAR: &str = "interimdatadir";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No base directory: set paths.base_dir or the interimdatadir env var")]
    MissingBaseDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub embedding: EmbeddingSection,
    #[serde(default)]
    pub datasets: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Interim data root. Empty means "take it from the environment".
    #[serde(default)]
    pub base_dir: PathBuf,
    #[serde(default = "default_input_subdir")]
    pub input_subdir: PathBuf,
    #[serde(default = "default_output_subdir")]
    pub output_subdir: PathBuf,
}

fn default_input_subdir()  -> PathBuf { PathBuf::from("ontology_mapping/input_data") }
fn default_output_subdir() -> PathBuf { PathBuf::from("ontology_mapping/output_data") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            input_subdir: default_input_subdir(),
            output_subdir: default_output_subdir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default)]
    pub model: EmbeddingModel,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub use_gpu: bool,
    #[serde(default)]
    pub normalize: bool,
    pub cache_dir: Option<String>,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_batch_size() -> usize { 32 }
fn default_max_length() -> usize { 512 }
fn default_cache_size() -> usize { 10_000 }

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::default(),
            batch_size: default_batch_size(),
            max_length: default_max_length(),
            use_gpu: false,
            normalize: false,
            cache_dir: None,
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_predicted")]
    pub predicted: String,
    #[serde(default = "default_observed")]
    pub observed: String,
    #[serde(default = "default_term_column")]
    pub term_column: String,
}

fn default_predicted()   -> String { "omim".to_string() }
fn default_observed()    -> String { "faers_cong".to_string() }
fn default_term_column() -> String { "Outcome".to_string() }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            predicted: default_predicted(),
            observed: default_observed(),
            term_column: default_term_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Fractional digits written for each similarity value.
    #[serde(default = "default_precision")]
    pub precision: usize,
    #[serde(default)]
    pub save_embeddings: bool,
    /// Rows and columns of the similarity preview logged per drug; 0 disables it.
    #[serde(default = "default_preview")]
    pub preview: usize,
}

fn default_precision() -> usize { 6 }
fn default_preview()   -> usize { 3 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            save_embeddings: false,
            preview: default_preview(),
        }
    }
}

mod tests;

impl MappingConfig {
    /// Load configuration from the environment and `ontomap.toml`.
    pub fn load() -> Result<Self> {
        match dotenvy::from_filename(DOTENV_FILE) {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) => debug!("No {} loaded: {}", DOTENV_FILE, e),
        }

        let explicit = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let env_base_dir = std::env::var(BASE_DIR_ENV_VAR).ok();
        Self::load_with(explicit.as_deref(), env_base_dir)
    }

    /// Load from an explicit file (must exist) or the default file (optional),
    /// then fill the base directory from `env_base_dir` if the file left it empty.
    pub fn load_with(explicit: Option<&Path>, env_base_dir: Option<String>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    info!("{} not found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        if config.paths.base_dir.as_os_str().is_empty() {
            match env_base_dir.filter(|v| !v.trim().is_empty()) {
                Some(dir) => config.paths.base_dir = PathBuf::from(dir.trim()),
                None => return Err(ConfigError::MissingBaseDir),
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject combinations the mapping job cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.paths.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingBaseDir);
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid("embedding.batch_size must be > 0".into()));
        }
        if !(1..=512).contains(&self.embedding.max_length) {
            return Err(ConfigError::Invalid(format!(
                "embedding.max_length must be within 1..=512, got {}",
                self.embedding.max_length
            )));
        }
        if self.output.precision > 12 {
            return Err(ConfigError::Invalid(format!(
                "output.precision must be <= 12, got {}",
                self.output.precision
            )));
        }
        if self.datasets.term_column.trim().is_empty() {
            return Err(ConfigError::Invalid("datasets.term_column is empty".into()));
        }
        for (key, id) in [
            ("datasets.predicted", &self.datasets.predicted),
            ("datasets.observed", &self.datasets.observed),
        ] {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} is empty")));
            }
            if id.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must not contain path separators: {id}"
                )));
            }
        }
        if self.datasets.predicted == self.datasets.observed {
            return Err(ConfigError::Invalid(format!(
                "datasets.predicted and datasets.observed are both '{}'",
                self.datasets.predicted
            )));
        }
        Ok(())
    }

    /// Directory holding one sub-folder per drug.
    pub fn input_dir(&self) -> PathBuf {
        self.paths.base_dir.join(&self.paths.input_subdir)
    }

    pub fn output_root(&self) -> PathBuf {
        self.paths.base_dir.join(&self.paths.output_subdir)
    }

    /// `<output_root>/<model repo id>`; the owner prefix becomes a directory.
    pub fn model_output_dir(&self) -> PathBuf {
        self.output_root().join(self.embedding.model.repo_id())
    }

    /// Settings handed to the embedder.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model: self.embedding.model,
            max_length: self.embedding.max_length,
            batch_size: self.embedding.batch_size,
            normalize: self.embedding.normalize,
            pooling: None,
            use_gpu: self.embedding.use_gpu,
            cache_dir: self.embedding.cache_dir.clone(),
            cache_size: self.embedding.cache_size,
        }
    }
}
