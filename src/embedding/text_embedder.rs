//! Text embedding trait for the recommendation pipeline.

use async_trait::async_trait;

use crate::error::Result;
use crate::vector::Vector;

/// Trait for converting text to vector embeddings.
///
/// Implementations are expected to be deterministic: the same text must always
/// produce the same vector, which makes re-encoding an item idempotent. An
/// implementation may truncate very long input.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding vector for the given text.
    ///
    /// # Arguments
    ///
    /// * `text` - The text to embed. May be empty.
    ///
    /// # Returns
    ///
    /// A vector of exactly [`TextEmbedder::dimension`] values
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Get the dimension of generated embeddings.
    fn dimension(&self) -> usize;

    /// Get the name/identifier of this embedder, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
