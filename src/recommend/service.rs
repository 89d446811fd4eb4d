//! The recommendation service facade.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{ItemCatalog, ItemSummary};
use crate::config::LibrisConfig;
use crate::embedding::{FeatureEncoder, TextEmbedder};
use crate::error::{LibrisError, Result};
use crate::recommend::aggregator::RecommendationAggregator;
use crate::store::EmbeddingStore;
use crate::vector::index::{IndexManager, IndexStats, IvfBuildConfig, SearchParams};

/// Runtime limits for the service surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline for a single `get_recommendations` call.
    pub recommend_timeout_ms: u64,
    /// Items encoded concurrently by `trigger_embedding_all`.
    pub embedding_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recommend_timeout_ms: 5_000,
            embedding_concurrency: num_cpus::get(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.recommend_timeout_ms == 0 {
            return Err(LibrisError::invalid_config(
                "recommend_timeout_ms must be positive",
            ));
        }
        if self.embedding_concurrency == 0 {
            return Err(LibrisError::invalid_config(
                "embedding_concurrency must be positive",
            ));
        }
        Ok(())
    }
}

/// Outcome of a bulk embedding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingReport {
    pub embedded: usize,
    /// Items that could not be embedded, ordered by item id.
    pub failures: Vec<EmbeddingFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingFailure {
    pub item_id: String,
    pub error: String,
}

/// An entry of the "other similar items" view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    #[serde(flatten)]
    pub item: ItemSummary,
    pub distance: f32,
}

/// Ties the catalog, embedding store, encoder, index and aggregator together.
pub struct RecommendationService {
    catalog: Arc<dyn ItemCatalog>,
    store: Arc<dyn EmbeddingStore>,
    encoder: FeatureEncoder,
    index: Arc<IndexManager>,
    aggregator: RecommendationAggregator,
    config: ServiceConfig,
}

impl std::fmt::Debug for RecommendationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationService")
            .field("encoder", &self.encoder)
            .field("index", &self.index)
            .field("aggregator", &self.aggregator)
            .field("config", &self.config)
            .finish()
    }
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn ItemCatalog>,
        store: Arc<dyn EmbeddingStore>,
        encoder: FeatureEncoder,
        index: Arc<IndexManager>,
        aggregator: RecommendationAggregator,
        config: ServiceConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            store,
            encoder,
            index,
            aggregator,
            config,
        })
    }

    /// Assemble a service from a validated [`LibrisConfig`].
    pub fn from_config(
        config: &LibrisConfig,
        catalog: Arc<dyn ItemCatalog>,
        store: Arc<dyn EmbeddingStore>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self> {
        config.validate()?;
        if embedder.dimension() != config.encoder.text_dimension {
            return Err(LibrisError::dimension_mismatch(
                format!("embedder {}", embedder.name()),
                config.encoder.text_dimension,
                embedder.dimension(),
            ));
        }

        let encoder = FeatureEncoder::new(embedder, config.encoder.year)?;
        let index = Arc::new(IndexManager::new(config.resolved_index_config())?);
        let aggregator = RecommendationAggregator::new(config.aggregator.clone())?;
        Self::new(
            catalog,
            store,
            encoder,
            index,
            aggregator,
            config.service.clone(),
        )
    }

    pub fn catalog(&self) -> &Arc<dyn ItemCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn EmbeddingStore> {
        &self.store
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn index_manager(&self) -> &Arc<IndexManager> {
        &self.index
    }

    /// Encode one item and store its embedding.
    ///
    /// Fails with `NotFound` for an unknown item. If encoding fails nothing is
    /// written.
    pub async fn trigger_embedding(&self, item_id: &str) -> Result<()> {
        self.embed_one(item_id).await?;
        self.store.flush().await
    }

    async fn embed_one(&self, item_id: &str) -> Result<()> {
        let item = self
            .catalog
            .get(item_id)
            .await?
            .ok_or_else(|| LibrisError::not_found(format!("item {item_id}")))?;
        let vector = self.encoder.encode_item(&item).await?;
        self.store.upsert(item_id, vector).await?;
        debug!(item_id, "stored embedding");
        Ok(())
    }

    /// Encode every catalog item with bounded concurrency.
    ///
    /// Per-item failures are collected in the report; the run itself only
    /// fails if the catalog cannot be listed or the store cannot be flushed.
    pub async fn trigger_embedding_all(&self) -> Result<EmbeddingReport> {
        let item_ids = self.catalog.item_ids().await?;
        let total = item_ids.len();

        let results: Vec<(String, Result<()>)> = stream::iter(item_ids)
            .map(|item_id| async move {
                let result = self.embed_one(&item_id).await;
                (item_id, result)
            })
            .buffer_unordered(self.config.embedding_concurrency)
            .collect()
            .await;

        let mut report = EmbeddingReport::default();
        for (item_id, result) in results {
            match result {
                Ok(()) => report.embedded += 1,
                Err(e) => {
                    warn!(item_id = %item_id, error = %e, "failed to embed item");
                    report.failures.push(EmbeddingFailure {
                        item_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
            .failures
            .sort_by(|a, b| a.item_id.cmp(&b.item_id));

        self.store.flush().await?;
        info!(
            total,
            embedded = report.embedded,
            failed = report.failures.len(),
            "bulk embedding finished"
        );
        Ok(report)
    }

    /// Rebuild the index from everything in the store and publish it.
    pub async fn trigger_index_rebuild(&self) -> Result<IndexStats> {
        self.rebuild(None).await
    }

    /// Rebuild with build parameters that apply to this build only.
    pub async fn trigger_index_rebuild_with(&self, config: IvfBuildConfig) -> Result<IndexStats> {
        self.rebuild(Some(config)).await
    }

    async fn rebuild(&self, config: Option<IvfBuildConfig>) -> Result<IndexStats> {
        let embeddings = self.store.all().await?;
        let index = self.index.clone();

        let snapshot = tokio::task::spawn_blocking(move || match config {
            Some(config) => index.build_with(embeddings, config),
            None => index.build(embeddings),
        })
        .await
        .map_err(|e| LibrisError::other(format!("index build task failed: {e}")))??;

        Ok(snapshot.stats())
    }

    /// Recommendations for a user's favorites, projected to summaries.
    ///
    /// `limit` defaults to the aggregator's configured limit. An empty list is
    /// a normal outcome; exceeding the configured deadline is a `Timeout`.
    pub async fn get_recommendations(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ItemSummary>> {
        let limit = limit.unwrap_or(self.aggregator.config().default_limit);
        let deadline = Duration::from_millis(self.config.recommend_timeout_ms);

        tokio::time::timeout(deadline, self.recommend_inner(user_id, limit))
            .await
            .map_err(|_| {
                LibrisError::timeout(format!(
                    "recommendations for user {user_id} exceeded {}ms",
                    self.config.recommend_timeout_ms
                ))
            })?
    }

    async fn recommend_inner(&self, user_id: &str, limit: usize) -> Result<Vec<ItemSummary>> {
        let favorites = self.catalog.get_favorites(user_id).await?;
        let ids = self
            .aggregator
            .recommend(
                &self.index,
                self.store.as_ref(),
                &favorites,
                self.aggregator.config().per_item_k,
                limit,
            )
            .await?;

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.catalog.get(&id).await? {
                Some(item) => summaries.push(item.summary()),
                None => debug!(item_id = %id, "recommended item no longer in catalog"),
            }
        }
        info!(user_id, recommended = summaries.len(), "served recommendations");
        Ok(summaries)
    }

    /// Up to `k` items closest to `item_id`, the item itself excluded.
    pub async fn similar_items(&self, item_id: &str, k: usize) -> Result<Vec<SimilarItem>> {
        if self.catalog.get(item_id).await?.is_none() {
            return Err(LibrisError::not_found(format!("item {item_id}")));
        }
        let embedding = self
            .store
            .get(item_id)
            .await?
            .ok_or_else(|| LibrisError::MissingEmbedding(item_id.to_string()))?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = self.index.search(&embedding, &SearchParams::new(k + 1))?;
        let mut similar = Vec::with_capacity(k);
        for hit in hits.into_iter().filter(|hit| hit.item_id != item_id) {
            if similar.len() == k {
                break;
            }
            if let Some(item) = self.catalog.get(&hit.item_id).await? {
                similar.push(SimilarItem {
                    item: item.summary(),
                    distance: hit.distance,
                });
            }
        }
        Ok(similar)
    }

    pub fn index_stats(&self) -> Option<IndexStats> {
        self.index.stats()
    }

    pub fn is_index_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Publish a snapshot previously written with [`save_index`](Self::save_index).
    pub async fn load_index(&self, path: &Path) -> Result<IndexStats> {
        let index = self.index.clone();
        let path = path.to_path_buf();
        let snapshot = tokio::task::spawn_blocking(move || index.load(&path))
            .await
            .map_err(|e| LibrisError::other(format!("index load task failed: {e}")))??;
        Ok(snapshot.stats())
    }

    pub async fn save_index(&self, path: &Path) -> Result<()> {
        let index = self.index.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || index.save(&path))
            .await
            .map_err(|e| LibrisError::other(format!("index save task failed: {e}")))?
    }
}
