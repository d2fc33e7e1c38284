//! BERT sentence embedder using Candle.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, PositionEmbeddingType};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::cache::TermCache;
use crate::pooling::l2_normalize;
use crate::{EmbedError, EmbeddingConfig, PoolingStrategy, Result, TextEmbedder};

/// Sentence embedder over a BERT checkpoint from the Hugging Face Hub.
///
/// Downloads the model on construction and serves batched inference
/// afterwards. Vectors for terms already seen are served from an LRU cache.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    config: EmbeddingConfig,
    pooling: PoolingStrategy,
    hidden_size: usize,
    pad_token_id: u32,
    cache: TermCache,
}

struct ModelFiles {
    bert_config: Config,
    tokenizer: Tokenizer,
    weights: PathBuf,
}

impl BertEmbedder {
    /// Download (or reuse from the hub cache) and load the configured model.
    pub async fn new(config: EmbeddingConfig) -> Result<Self> {
        let start = Instant::now();
        let repo_id = config.model.repo_id();
        info!("Loading embedding model: {}", repo_id);

        let device = Self::select_device(&config);
        debug!("Using device: {:?}", device);

        let cache_dir = config.cache_dir.clone();
        let files = tokio::task::spawn_blocking(move || Self::fetch_files(repo_id, cache_dir))
            .await
            .map_err(|e| EmbedError::ModelLoad {
                model: repo_id.to_string(),
                reason: format!("download task failed: {e}"),
            })??;

        info!("Model files ready, loading weights into memory...");
        let vb = if files.weights.extension().is_some_and(|e| e == "safetensors") {
            // bf16 checkpoints are widened to F32 here.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&files.weights, DType::F32, &device)?
        };

        let model = BertModel::load(vb, &files.bert_config)
            .map_err(|e| EmbedError::ModelLoad {
                model: repo_id.to_string(),
                reason: e.to_string(),
            })?;
        info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());
        if files.bert_config.hidden_size != config.model.expected_dimension() {
            warn!(
                expected = config.model.expected_dimension(),
                found = files.bert_config.hidden_size,
                "Unexpected hidden size for {}", repo_id
            );
        }

        let mut tokenizer = files.tokenizer;
        let max_tokens = config.max_length.min(files.bert_config.max_position_embeddings);
        crate::tokenizer::prepare(&mut tokenizer, max_tokens)?;
        let cache = TermCache::new(config.cache_size);

        Ok(Self {
            model,
            tokenizer,
            device,
            pooling: config.effective_pooling(),
            hidden_size: files.bert_config.hidden_size,
            pad_token_id: files.bert_config.pad_token_id as u32,
            config,
            cache,
        })
    }

    fn fetch_files(repo_id: &str, cache_dir: Option<String>) -> Result<ModelFiles> {
        let mut builder = ApiBuilder::new();
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(PathBuf::from(dir));
        }
        let download_err = |file: &'static str| {
            move |e: hf_hub::api::sync::ApiError| EmbedError::Download {
                repo: repo_id.to_string(),
                file,
                reason: e.to_string(),
            }
        };
        let api = builder.build().map_err(download_err("hub API client"))?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").map_err(download_err("config.json"))?;
        let bert_config = Self::load_config(&config_path)?;

        let tokenizer = match repo.get("tokenizer.json") {
            Ok(path) => Tokenizer::from_file(&path)?,
            Err(_) => {
                info!("tokenizer.json not found, building WordPiece from vocab.txt");
                let vocab_path = repo.get("vocab.txt").map_err(download_err("vocab.txt"))?;
                crate::tokenizer::from_vocab(&vocab_path)?
            }
        };

        let weights = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .map_err(download_err("model weights"))?;
        debug!("Weights at: {:?}", weights);

        Ok(ModelFiles {
            bert_config,
            tokenizer,
            weights,
        })
    }

    fn select_device(config: &EmbeddingConfig) -> Device {
        if !config.use_gpu {
            return Device::Cpu;
        }

        #[cfg(feature = "cuda")]
        match Device::new_cuda(0) {
            Ok(device) => return device,
            Err(e) => debug!("CUDA not available: {}, falling back to CPU", e),
        }

        #[cfg(feature = "metal")]
        match Device::new_metal(0) {
            Ok(device) => return device,
            Err(e) => debug!("Metal not available: {}, falling back to CPU", e),
        }

        Device::Cpu
    }

    /// Parse config.json leniently; sentence-transformers exports omit fields now and then.
    fn load_config(path: &Path) -> Result<Config> {
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let uint = |key: &str, default: u64| json.get(key).and_then(|v| v.as_u64()).unwrap_or(default) as usize;
        let float = |key: &str, default: f64| json.get(key).and_then(|v| v.as_f64()).unwrap_or(default);

        let hidden_act = match json.get("hidden_act").and_then(|v| v.as_str()) {
            Some("relu") => HiddenAct::Relu,
            Some("gelu_new") | Some("gelu_approximate") => HiddenAct::GeluApproximate,
            _ => HiddenAct::Gelu,
        };

        Ok(Config {
            vocab_size: uint("vocab_size", 30522),
            hidden_size: uint("hidden_size", 768),
            num_hidden_layers: uint("num_hidden_layers", 12),
            num_attention_heads: uint("num_attention_heads", 12),
            intermediate_size: uint("intermediate_size", 3072),
            hidden_act,
            hidden_dropout_prob: float("hidden_dropout_prob", 0.1),
            max_position_embeddings: uint("max_position_embeddings", 512),
            type_vocab_size: uint("type_vocab_size", 2),
            initializer_range: float("initializer_range", 0.02),
            layer_norm_eps: float("layer_norm_eps", 1e-12),
            pad_token_id: uint("pad_token_id", 0),
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: true,
            classifier_dropout: None,
            // lets BertModel::load retry under a "bert." weight prefix
            model_type: json.get("model_type").and_then(|v| v.as_str()).map(str::to_string),
        })
    }

    /// Embed one batch of at most `batch_size` texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer.encode_batch(refs, true)?;

        // Encodings are already truncated; pad to the longest in the batch.
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let batch = texts.len();
        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);

        for encoding in &encodings {
            let len = encoding.get_ids().len();
            ids.extend_from_slice(encoding.get_ids());
            mask.extend(encoding.get_attention_mask().iter().map(|&m| m as f32));
            type_ids.extend_from_slice(encoding.get_type_ids());

            let pad = seq_len - len;
            ids.extend(std::iter::repeat_n(self.pad_token_id, pad));
            mask.extend(std::iter::repeat_n(0.0f32, pad));
            type_ids.extend(std::iter::repeat_n(0u32, pad));
        }

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(type_ids, (batch, seq_len), &self.device)?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = self.pooling.apply(&hidden, &attention_mask)?;
        let pooled = if self.config.normalize {
            l2_normalize(&pooled)?
        } else {
            pooled
        };

        Ok(pooled.to_vec2::<f32>()?)
    }

    /// Check if GPU is being used.
    pub fn is_gpu(&self) -> bool {
        matches!(self.device, Device::Cuda(_) | Device::Metal(_))
    }
}

#[async_trait]
impl TextEmbedder for BertEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let resolved = self.cache.resolve(
            self.model_name(),
            texts,
            self.config.batch_size,
            |chunk| self.embed_batch(chunk),
        )?;
        debug!(
            n = texts.len(),
            computed = resolved.computed,
            "Embedded terms in {:.2}ms",
            start.elapsed().as_secs_f32() * 1000.0
        );
        Ok(resolved.vectors)
    }

    fn model_name(&self) -> &str {
        self.config.model.repo_id()
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }
}
