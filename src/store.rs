//! Persistence of one embedding per catalog item.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::vector::Vector;

pub use self::file::FileEmbeddingStore;
pub use self::memory::MemoryEmbeddingStore;

/// Storage of item embeddings keyed by item id.
///
/// An embedding is written whole or not at all. Upserts to different items
/// may run concurrently.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// The stored embedding for `item_id`, if any.
    async fn get(&self, item_id: &str) -> Result<Option<Vector>>;

    /// Insert or replace the embedding for `item_id`.
    async fn upsert(&self, item_id: &str, vector: Vector) -> Result<()>;

    /// Every stored embedding, ordered by item id.
    async fn all(&self) -> Result<Vec<(String, Vector)>>;

    /// Number of stored embeddings.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Make pending upserts durable. A no-op for stores without a backing file.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
