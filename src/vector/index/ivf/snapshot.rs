//! The immutable IVF index snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vector::{DistanceMetric, Vector};

/// A fully built IVF index.
///
/// Vectors are addressed by their internal ordinal, the position in `item_ids`
/// and `vectors`. Inverted lists hold ordinals in ascending order. A snapshot is
/// never mutated once built; a rebuild produces a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfIndex {
    pub(crate) build_id: Uuid,
    pub(crate) built_at: DateTime<Utc>,
    pub(crate) metric: DistanceMetric,
    pub(crate) dimension: usize,
    pub(crate) default_nprobe: usize,
    pub(crate) centroids: Vec<Vector>,
    pub(crate) inverted_lists: Vec<Vec<u32>>,
    pub(crate) vectors: Vec<Vector>,
    pub(crate) item_ids: Vec<String>,
}

/// Summary information about a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub metric: DistanceMetric,
    pub dimension: usize,
    pub nlist: usize,
    pub default_nprobe: usize,
    pub vector_count: usize,
    pub largest_list: usize,
    pub empty_lists: usize,
}

impl IvfIndex {
    /// Unique identifier of the build that produced this snapshot.
    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// Dimension shared by every vector in the snapshot.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Metric used for ranking.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of centroids.
    pub fn nlist(&self) -> usize {
        self.centroids.len()
    }

    /// Build-time default for the number of lists searched per query.
    pub fn default_nprobe(&self) -> usize {
        self.default_nprobe
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    /// Item id stored at an internal ordinal.
    pub fn item_id(&self, ordinal: u32) -> Option<&str> {
        self.item_ids.get(ordinal as usize).map(String::as_str)
    }

    /// Ordinal → item id map.
    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn centroids(&self) -> &[Vector] {
        &self.centroids
    }

    pub fn inverted_lists(&self) -> &[Vec<u32>] {
        &self.inverted_lists
    }

    /// Vector stored at an internal ordinal.
    pub fn vector(&self, ordinal: u32) -> Option<&Vector> {
        self.vectors.get(ordinal as usize)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            build_id: self.build_id,
            built_at: self.built_at,
            metric: self.metric,
            dimension: self.dimension,
            nlist: self.nlist(),
            default_nprobe: self.default_nprobe,
            vector_count: self.len(),
            largest_list: self.inverted_lists.iter().map(Vec::len).max().unwrap_or(0),
            empty_lists: self.inverted_lists.iter().filter(|l| l.is_empty()).count(),
        }
    }

    /// Check the internal invariants a loaded snapshot must satisfy.
    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.vectors.len() != self.item_ids.len() {
            return Err(format!(
                "{} vectors but {} item ids",
                self.vectors.len(),
                self.item_ids.len()
            ));
        }
        if self.centroids.is_empty() {
            return Err("no centroids".to_string());
        }
        if self.inverted_lists.len() != self.centroids.len() {
            return Err(format!(
                "{} inverted lists for {} centroids",
                self.inverted_lists.len(),
                self.centroids.len()
            ));
        }
        if self.default_nprobe == 0 || self.default_nprobe > self.centroids.len() {
            return Err(format!("nprobe {} out of range", self.default_nprobe));
        }
        if let Some(bad) = self
            .centroids
            .iter()
            .chain(self.vectors.iter())
            .find(|v| v.dimension() != self.dimension)
        {
            return Err(format!(
                "vector of dimension {} in index of dimension {}",
                bad.dimension(),
                self.dimension
            ));
        }

        let mut seen = vec![false; self.vectors.len()];
        for ordinal in self.inverted_lists.iter().flatten() {
            match seen.get_mut(*ordinal as usize) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("ordinal {ordinal} listed twice")),
                None => return Err(format!("ordinal {ordinal} out of range")),
            }
        }
        if seen.iter().any(|s| !s) {
            return Err("vector missing from inverted lists".to_string());
        }
        Ok(())
    }
}
