//! The embedding seam the mapping pipeline is written against.

use async_trait::async_trait;

use crate::Result;

/// Turns an ordered list of terms into one vector per term, same order.
///
/// Implementations are constructed once per process and shared read-only
/// across all drug folders.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed `texts`; the output has exactly `texts.len()` rows.
    /// Empty input yields an empty output.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the underlying model, used for output directory names.
    fn model_name(&self) -> &str;

    /// Width of every vector this embedder returns.
    fn dimension(&self) -> usize;
}
