//! Token-to-sentence pooling.

use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

/// How token states of one term collapse into a single vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolingStrategy {
    /// Average of non-padding token states
    #[default]
    Mean,

    /// State of the leading [CLS] token
    Cls,

    /// Element-wise maximum over non-padding tokens
    Max,
}

impl PoolingStrategy {
    /// `hidden` is (batch, seq_len, dim); `mask` is (batch, seq_len) in F32.
    /// Returns (batch, dim).
    pub fn apply(&self, hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Mean => mean_pool(hidden, mask),
            PoolingStrategy::Cls => hidden.narrow(1, 0, 1)?.squeeze(1),
            PoolingStrategy::Max => max_pool(hidden, mask),
        }
    }
}

fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    // An all-padding row would divide by zero.
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

fn max_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    // Padding positions get pushed to -1e9 so they never win the max.
    let penalty = ((mask.to_dtype(DType::F32)?.unsqueeze(2)? - 1.0)? * 1e9)?;
    hidden.broadcast_add(&penalty)?.max(1)
}

/// Scale each row of a (batch, dim) tensor to unit length.
pub fn l2_normalize(rows: &Tensor) -> candle_core::Result<Tensor> {
    let norms = rows.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-9f32, f32::MAX)?;
    rows.broadcast_div(&norms)
}
