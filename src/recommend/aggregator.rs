//! Merging per-favorite neighbour lists into one recommendation list.

use std::collections::HashSet;

use ahash::AHashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LibrisError, Result};
use crate::store::EmbeddingStore;
use crate::vector::index::{IndexManager, IvfIndex, SearchParams};

/// How the final list is chosen when there are more candidates than the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniform random sample of exactly `limit` candidates.
    #[default]
    RandomSample,
    /// The `limit` candidates closest to any favorite, ties broken by id.
    Ranked,
}

/// Aggregator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Neighbours requested per favorite.
    pub per_item_k: usize,
    /// Result size used when the caller does not pass one.
    pub default_limit: usize,
    pub policy: SelectionPolicy,
    /// Seed for the sampling RNG; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            per_item_k: 10,
            default_limit: 10,
            policy: SelectionPolicy::RandomSample,
            seed: None,
        }
    }
}

impl AggregatorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_item_k == 0 {
            return Err(LibrisError::invalid_config("per_item_k must be positive"));
        }
        if self.default_limit == 0 {
            return Err(LibrisError::invalid_config("default_limit must be positive"));
        }
        Ok(())
    }
}

/// A candidate and its smallest distance to any favorite.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    item_id: String,
    distance: f32,
}

/// Builds recommendation lists from favorites.
#[derive(Debug)]
pub struct RecommendationAggregator {
    config: AggregatorConfig,
    rng: Mutex<StdRng>,
}

impl RecommendationAggregator {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Recommend up to `limit` item ids for a user with the given favorites.
    ///
    /// Favorites without a stored embedding are skipped, as are per-favorite
    /// store or search failures. No favorites, no embeddings or no published
    /// snapshot all yield an empty list rather than an error.
    pub async fn recommend(
        &self,
        index: &IndexManager,
        store: &dyn EmbeddingStore,
        favorites: &HashSet<String>,
        per_item_k: usize,
        limit: usize,
    ) -> Result<Vec<String>> {
        if favorites.is_empty() || per_item_k == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let snapshot = match index.snapshot() {
            Ok(snapshot) => snapshot,
            Err(LibrisError::IndexNotReady) => {
                debug!("no index snapshot published; returning no recommendations");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let candidates = self
            .collect_candidates(&snapshot, store, favorites, per_item_k)
            .await;
        let selected = self.select(candidates, limit);

        debug!(
            favorites = favorites.len(),
            recommended = selected.len(),
            policy = ?self.config.policy,
            "aggregated recommendations"
        );
        Ok(selected)
    }

    /// Search once per favorite and merge the hits, in first-seen order.
    async fn collect_candidates(
        &self,
        snapshot: &IvfIndex,
        store: &dyn EmbeddingStore,
        favorites: &HashSet<String>,
        per_item_k: usize,
    ) -> Vec<Candidate> {
        // Sorted so that the merge order, and therefore seeded sampling, is
        // reproducible.
        let mut ordered: Vec<&String> = favorites.iter().collect();
        ordered.sort();

        let params = SearchParams::new(per_item_k);
        let mut merged: Vec<Candidate> = Vec::new();
        let mut positions: AHashMap<String, usize> = AHashMap::new();

        for favorite in ordered {
            let embedding = match store.get(favorite).await {
                Ok(Some(embedding)) => embedding,
                Ok(None) => {
                    debug!(error = %LibrisError::MissingEmbedding(favorite.clone()), "skipping favorite");
                    continue;
                }
                Err(e) => {
                    warn!(item_id = %favorite, error = %e, "embedding lookup failed; skipping favorite");
                    continue;
                }
            };

            let hits = match snapshot.search(&embedding, &params) {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(item_id = %favorite, error = %e, "search failed; skipping favorite");
                    continue;
                }
            };

            for hit in hits.into_iter().filter(|hit| hit.item_id != *favorite) {
                match positions.get(&hit.item_id) {
                    Some(&pos) => {
                        let existing = &mut merged[pos];
                        existing.distance = existing.distance.min(hit.distance);
                    }
                    None => {
                        positions.insert(hit.item_id.clone(), merged.len());
                        merged.push(Candidate {
                            item_id: hit.item_id,
                            distance: hit.distance,
                        });
                    }
                }
            }
        }

        merged.retain(|candidate| !favorites.contains(&candidate.item_id));
        merged
    }

    fn select(&self, mut candidates: Vec<Candidate>, limit: usize) -> Vec<String> {
        if candidates.len() > limit {
            match self.config.policy {
                SelectionPolicy::RandomSample => {
                    let mut picked =
                        rand::seq::index::sample(&mut *self.rng.lock(), candidates.len(), limit)
                            .into_vec();
                    picked.sort_unstable();
                    return picked
                        .into_iter()
                        .map(|i| std::mem::take(&mut candidates[i].item_id))
                        .collect();
                }
                SelectionPolicy::Ranked => {
                    candidates.sort_by(|a, b| {
                        a.distance
                            .total_cmp(&b.distance)
                            .then_with(|| a.item_id.cmp(&b.item_id))
                    });
                    candidates.truncate(limit);
                }
            }
        }
        candidates.into_iter().map(|c| c.item_id).collect()
    }
}
