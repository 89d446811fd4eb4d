//! In-memory embedding store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::store::EmbeddingStore;
use crate::vector::Vector;

/// Embeddings held in a sorted map behind a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryEmbeddingStore {
    embeddings: RwLock<BTreeMap<String, Vector>>,
}

impl MemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_embeddings<I>(embeddings: I) -> Self
    where
        I: IntoIterator<Item = (String, Vector)>,
    {
        Self {
            embeddings: RwLock::new(embeddings.into_iter().collect()),
        }
    }
}

#[async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn get(&self, item_id: &str) -> Result<Option<Vector>> {
        Ok(self.embeddings.read().get(item_id).cloned())
    }

    async fn upsert(&self, item_id: &str, vector: Vector) -> Result<()> {
        self.embeddings.write().insert(item_id.to_string(), vector);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, Vector)>> {
        Ok(self
            .embeddings
            .read()
            .iter()
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.embeddings.read().len())
    }
}
