//! IVF index builder: k-means training and inverted list assignment.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LibrisError, Result};
use crate::vector::index::config::IvfBuildConfig;
use crate::vector::index::ivf::snapshot::IvfIndex;
use crate::vector::{DistanceMetric, Vector};

/// Above this many vectors, assignment runs on the rayon pool.
const PARALLEL_ASSIGN_THRESHOLD: usize = 1000;

/// Builder for IVF vector indexes.
///
/// A build is all-or-nothing: [`IvfIndexBuilder::build`] either returns a fully
/// formed [`IvfIndex`] or an error, never a partial index.
#[derive(Debug, Clone)]
pub struct IvfIndexBuilder {
    config: IvfBuildConfig,
}

impl IvfIndexBuilder {
    /// Create a new IVF index builder.
    pub fn new(config: IvfBuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IvfBuildConfig {
        &self.config
    }

    /// Build an index over `(item_id, vector)` pairs.
    ///
    /// Pairs are ordered by item id before ordinals are assigned, so the same
    /// input always yields the same ordinals. `nlist` is clamped to the number of
    /// vectors and `nprobe` to the effective `nlist`.
    pub fn build(&self, mut embeddings: Vec<(String, Vector)>) -> Result<IvfIndex> {
        let start = Instant::now();

        if embeddings.is_empty() {
            return Err(LibrisError::EmptyTrainingSet);
        }

        embeddings.sort_by(|a, b| a.0.cmp(&b.0));
        let dimension = self.validate_vectors(&embeddings)?;

        let nlist = self.config.nlist.clamp(1, embeddings.len());
        let nprobe = self.config.nprobe.clamp(1, nlist);
        if nlist < self.config.nlist {
            debug!(
                requested = self.config.nlist,
                effective = nlist,
                "reducing nlist to the number of training vectors"
            );
        }

        let (item_ids, vectors): (Vec<String>, Vec<Vector>) = embeddings.into_iter().unzip();

        let centroids = self.train_centroids(&vectors, nlist);
        let inverted_lists = self.build_inverted_lists(&vectors, &centroids);

        let index = IvfIndex {
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            metric: self.config.metric,
            dimension,
            default_nprobe: nprobe,
            centroids,
            inverted_lists,
            vectors,
            item_ids,
        };

        info!(
            build_id = %index.build_id,
            vectors = index.len(),
            dimension,
            nlist,
            nprobe,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built IVF index"
        );
        Ok(index)
    }

    /// Check ids and vectors, returning the shared dimension.
    fn validate_vectors(&self, embeddings: &[(String, Vector)]) -> Result<usize> {
        let dimension = self
            .config
            .dimension
            .unwrap_or_else(|| embeddings[0].1.dimension());
        if dimension == 0 {
            return Err(LibrisError::invalid_argument(
                "cannot index zero-dimensional vectors",
            ));
        }

        let mut seen = HashSet::with_capacity(embeddings.len());
        for (item_id, vector) in embeddings {
            if !seen.insert(item_id.as_str()) {
                return Err(LibrisError::invalid_argument(format!(
                    "duplicate item id {item_id} in training set"
                )));
            }
            vector.validate_dimension(dimension, &format!("item {item_id}"))?;
            if !vector.is_valid() {
                return Err(LibrisError::InvalidVector(format!("item {item_id}")));
            }
        }

        Ok(dimension)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Train centroids using k-means clustering.
    fn train_centroids(&self, vectors: &[Vector], nlist: usize) -> Vec<Vector> {
        let mut rng = self.rng();
        let mut centroids = self.init_centroids_kmeans_plus_plus(vectors, nlist, &mut rng);

        for iteration in 0..self.config.max_iterations {
            let assignments = self.assign(vectors, &centroids);
            let movement = self.update_centroids(vectors, &assignments, &mut centroids);

            if movement < self.config.convergence_threshold {
                debug!(iterations = iteration + 1, "k-means converged");
                break;
            }
        }

        centroids
    }

    /// Initialize centroids using the k-means++ algorithm.
    fn init_centroids_kmeans_plus_plus(
        &self,
        vectors: &[Vector],
        nlist: usize,
        rng: &mut StdRng,
    ) -> Vec<Vector> {
        let metric = self.config.metric;
        let mut centroids = Vec::with_capacity(nlist);

        let first_idx = rng.random_range(0..vectors.len());
        centroids.push(vectors[first_idx].clone());

        // Nearest-centroid distance for every vector, refreshed as centroids are added.
        let mut nearest: Vec<f32> = vectors
            .iter()
            .map(|v| metric.distance_unchecked(&v.data, &centroids[0].data))
            .collect();

        while centroids.len() < nlist {
            let weights: Vec<f32> = nearest
                .iter()
                .map(|&d| seeding_weight(metric, d))
                .collect();
            let total_weight: f32 = weights.iter().sum();

            let next_idx = if total_weight > 0.0 && total_weight.is_finite() {
                let target = rng.random::<f32>() * total_weight;
                let mut cumsum = 0.0;
                let mut chosen = weights.len() - 1;
                for (i, &weight) in weights.iter().enumerate() {
                    cumsum += weight;
                    if weight > 0.0 && cumsum >= target {
                        chosen = i;
                        break;
                    }
                }
                chosen
            } else {
                // All remaining points coincide with a centroid.
                rng.random_range(0..vectors.len())
            };

            let centroid = vectors[next_idx].clone();
            for (d, v) in nearest.iter_mut().zip(vectors) {
                *d = d.min(metric.distance_unchecked(&v.data, &centroid.data));
            }
            centroids.push(centroid);
        }

        centroids
    }

    /// Assign each vector to its nearest centroid.
    fn assign(&self, vectors: &[Vector], centroids: &[Vector]) -> Vec<usize> {
        let metric = self.config.metric;
        if self.config.parallel_build && vectors.len() > PARALLEL_ASSIGN_THRESHOLD {
            vectors
                .par_iter()
                .map(|v| nearest_centroid(metric, v, centroids))
                .collect()
        } else {
            vectors
                .iter()
                .map(|v| nearest_centroid(metric, v, centroids))
                .collect()
        }
    }

    /// Recompute centroids as cluster means, returning the mean movement.
    fn update_centroids(
        &self,
        vectors: &[Vector],
        assignments: &[usize],
        centroids: &mut [Vector],
    ) -> f32 {
        let dimension = centroids[0].dimension();
        let mut sums = vec![vec![0.0f32; dimension]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];

        for (vector, &cluster) in vectors.iter().zip(assignments) {
            counts[cluster] += 1;
            for (acc, &value) in sums[cluster].iter_mut().zip(&vector.data) {
                *acc += value;
            }
        }

        let mut total_movement = 0.0;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
            if count == 0 {
                // Keep the old centroid if no vectors were assigned.
                continue;
            }
            let updated = Vector::new(sum.into_iter().map(|s| s / count as f32).collect());
            total_movement += DistanceMetric::SquaredEuclidean
                .distance_unchecked(&centroid.data, &updated.data);
            *centroid = updated;
        }

        total_movement / centroids.len() as f32
    }

    /// Place every ordinal into the list of its nearest centroid.
    fn build_inverted_lists(&self, vectors: &[Vector], centroids: &[Vector]) -> Vec<Vec<u32>> {
        let assignments = self.assign(vectors, centroids);
        let mut lists = vec![Vec::new(); centroids.len()];
        for (ordinal, cluster) in assignments.into_iter().enumerate() {
            lists[cluster].push(ordinal as u32);
        }
        lists
    }
}

/// Index of the nearest centroid; ties go to the lowest index.
pub(crate) fn nearest_centroid(metric: DistanceMetric, vector: &Vector, centroids: &[Vector]) -> usize {
    let mut best_cluster = 0;
    let mut best_distance = f32::INFINITY;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = metric.distance_unchecked(&vector.data, &centroid.data);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = i;
        }
    }

    best_cluster
}

/// k-means++ samples proportionally to the squared distance.
fn seeding_weight(metric: DistanceMetric, distance: f32) -> f32 {
    let d = distance.max(0.0);
    match metric {
        DistanceMetric::SquaredEuclidean => d,
        _ => d * d,
    }
}
