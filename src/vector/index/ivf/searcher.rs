//! Approximate top-k search over an IVF snapshot.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vector::Vector;
use crate::vector::index::ivf::snapshot::IvfIndex;

/// Above this many candidate vectors, lists are scanned on the rayon pool.
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

/// Per-query search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of results to return.
    pub k: usize,
    /// Lists to search; `None` uses the snapshot's build-time default.
    pub nprobe: Option<usize>,
}

impl SearchParams {
    pub fn new(k: usize) -> Self {
        Self { k, nprobe: None }
    }

    pub fn with_nprobe(mut self, nprobe: usize) -> Self {
        self.nprobe = Some(nprobe);
        self
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub item_id: String,
    pub ordinal: u32,
    pub distance: f32,
}

/// Ascending distance, ties broken by ascending ordinal.
fn hit_order(a: &(f32, u32), b: &(f32, u32)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

impl IvfIndex {
    /// Return the approximate `k` nearest items to `query`, nearest first.
    ///
    /// Only the `nprobe` lists whose centroids are closest to the query are
    /// scanned. A stored item whose vector equals the query appears in the
    /// results at distance zero; callers wanting "other" items filter it out.
    pub fn search(&self, query: &Vector, params: &SearchParams) -> Result<Vec<SearchHit>> {
        query.validate_dimension(self.dimension, "query vector")?;
        if params.k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let nprobe = params
            .nprobe
            .unwrap_or(self.default_nprobe)
            .clamp(1, self.nlist());

        let mut candidates: Vec<(f32, u32)> = {
            let selected = self.nearest_lists(query, nprobe)?;
            let total: usize = selected.iter().map(|&l| self.inverted_lists[l].len()).sum();
            let scan = move |list: usize| {
                self.inverted_lists[list].iter().map(move |&ordinal| {
                    let vector = &self.vectors[ordinal as usize];
                    (
                        self.metric.distance_unchecked(&query.data, &vector.data),
                        ordinal,
                    )
                })
            };

            if total > PARALLEL_SCAN_THRESHOLD {
                selected
                    .par_iter()
                    .flat_map_iter(|&list| scan(list))
                    .collect()
            } else {
                selected.iter().flat_map(|&list| scan(list)).collect()
            }
        };

        if candidates.len() > params.k {
            candidates.select_nth_unstable_by(params.k - 1, hit_order);
            candidates.truncate(params.k);
        }
        candidates.sort_unstable_by(hit_order);

        Ok(candidates
            .into_iter()
            .map(|(distance, ordinal)| SearchHit {
                item_id: self.item_ids[ordinal as usize].clone(),
                ordinal,
                distance,
            })
            .collect())
    }

    /// Indices of the `nprobe` centroids nearest to the query.
    fn nearest_lists(&self, query: &Vector, nprobe: usize) -> Result<Vec<usize>> {
        let centroids: Vec<&[f32]> = self.centroids.iter().map(|c| c.as_slice()).collect();
        let distances = self
            .metric
            .batch_distance_parallel(&query.data, &centroids)?;

        let mut ranked: Vec<(f32, usize)> = distances.into_iter().zip(0..).collect();
        ranked.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(ranked.into_iter().take(nprobe).map(|(_, i)| i).collect())
    }
}
