//! Supported sentence-embedding models.
//!
//! Only BERT-architecture checkpoints are listed: the embedder loads them
//! through `candle_transformers::models::bert`. Each model carries the pooling
//! strategy its sentence-transformers head was trained with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{EmbedError, PoolingStrategy};

/// A pretrained model the mapping job can run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EmbeddingModel {
    /// General-purpose MiniLM, 384 dimensions.
    #[serde(
        rename = "sentence-transformers/all-MiniLM-L6-v2",
        alias = "all-MiniLM-L6-v2"
    )]
    AllMiniLmL6V2,

    /// PubMedBERT fine-tuned on MS MARCO.
    #[serde(
        rename = "pritamdeka/S-PubMedBert-MS-MARCO",
        alias = "S-PubMedBert-MS-MARCO"
    )]
    SPubMedBertMsMarco,

    /// BioLinkBERT trained contrastively (SimCSE) on biomedical text.
    #[serde(
        rename = "kamalkraj/BioSimCSE-BioLinkBERT-BASE",
        alias = "BioSimCSE-BioLinkBERT-BASE"
    )]
    BioSimCseBioLinkBert,

    /// SapBERT on PubMedBERT, bf16 weights. Tuned for UMLS concept names.
    #[default]
    #[serde(
        rename = "UMCU/SapBERT-from-PubMedBERT-fulltext_bf16",
        alias = "SapBERT-from-PubMedBERT-fulltext_bf16"
    )]
    SapBertPubMedBert,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 4] = [
        EmbeddingModel::AllMiniLmL6V2,
        EmbeddingModel::SPubMedBertMsMarco,
        EmbeddingModel::BioSimCseBioLinkBert,
        EmbeddingModel::SapBertPubMedBert,
    ];

    /// Hugging Face repository id.
    pub fn repo_id(&self) -> &'static str {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            EmbeddingModel::SPubMedBertMsMarco => "pritamdeka/S-PubMedBert-MS-MARCO",
            EmbeddingModel::BioSimCseBioLinkBert => "kamalkraj/BioSimCSE-BioLinkBERT-BASE",
            EmbeddingModel::SapBertPubMedBert => "UMCU/SapBERT-from-PubMedBERT-fulltext_bf16",
        }
    }

    /// Repository name without the owner prefix.
    pub fn short_name(&self) -> &'static str {
        let id = self.repo_id();
        id.rsplit('/').next().unwrap_or(id)
    }

    pub fn pooling(&self) -> PoolingStrategy {
        match self {
            EmbeddingModel::AllMiniLmL6V2 | EmbeddingModel::SPubMedBertMsMarco => {
                PoolingStrategy::Mean
            }
            EmbeddingModel::BioSimCseBioLinkBert | EmbeddingModel::SapBertPubMedBert => {
                PoolingStrategy::Cls
            }
        }
    }

    /// Hidden size the checkpoint is published with.
    pub fn expected_dimension(&self) -> usize {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => 384,
            _ => 768,
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repo_id())
    }
}

impl FromStr for EmbeddingModel {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.repo_id() == needle || m.short_name() == needle)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.repo_id()).collect();
                EmbedError::UnsupportedModel(format!(
                    "{needle} (supported: {})",
                    known.join(", ")
                ))
            })
    }
}
