//! Distance metrics for vector similarity calculation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LibrisError, Result};
use crate::util::simd;

/// Distance metrics for vector similarity calculation.
///
/// The index ranks by [`DistanceMetric::SquaredEuclidean`]; the other metrics are
/// kept for diagnostics and ad-hoc comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Squared Euclidean (L2²) distance
    #[default]
    SquaredEuclidean,
    /// Euclidean (L2) distance
    Euclidean,
    /// Cosine distance (1 - cosine similarity)
    Cosine,
    /// Negated dot product (lower is more similar)
    DotProduct,
}

impl DistanceMetric {
    /// Calculate the distance between two vectors using this metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(LibrisError::dimension_mismatch(
                "distance calculation",
                a.len(),
                b.len(),
            ));
        }
        Ok(self.distance_unchecked(a, b))
    }

    /// Distance without the length check; callers guarantee equal lengths.
    #[inline]
    pub(crate) fn distance_unchecked(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::SquaredEuclidean => simd::squared_l2(a, b),
            DistanceMetric::Euclidean => simd::squared_l2(a, b).sqrt(),
            DistanceMetric::Cosine => {
                let dot_product = simd::dot(a, b);
                let norm_a = simd::dot(a, a).sqrt();
                let norm_b = simd::dot(b, b).sqrt();

                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0 // Maximum distance for zero vectors
                } else {
                    1.0 - (dot_product / (norm_a * norm_b))
                }
            }
            DistanceMetric::DotProduct => -simd::dot(a, b),
        }
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::SquaredEuclidean => "squared_euclidean",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse a distance metric from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "squared_euclidean" | "l2sq" => Ok(DistanceMetric::SquaredEuclidean),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot_product" | "dot" => Ok(DistanceMetric::DotProduct),
            _ => Err(LibrisError::invalid_argument(format!(
                "Unknown distance metric: {s}"
            ))),
        }
    }

    /// Calculate distance between a query vector and multiple vectors in parallel.
    pub fn batch_distance_parallel(&self, query: &[f32], vectors: &[&[f32]]) -> Result<Vec<f32>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        if vectors.len() < 100 {
            return vectors
                .iter()
                .map(|v| self.distance(query, v))
                .collect::<Result<Vec<_>>>();
        }

        vectors
            .par_iter()
            .map(|v| self.distance(query, v))
            .collect::<Result<Vec<_>>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_euclidean() {
        let metric = DistanceMetric::SquaredEuclidean;
        assert_eq!(metric.distance(&[0.0, 0.0], &[0.0, 1.0]).unwrap(), 1.0);
        assert_eq!(metric.distance(&[0.0, 0.0], &[10.0, 10.0]).unwrap(), 200.0);
    }

    #[test]
    fn test_euclidean_is_root_of_squared() {
        let d = DistanceMetric::Euclidean
            .distance(&[0.0, 0.0], &[3.0, 4.0])
            .unwrap();
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let d = DistanceMetric::Cosine
            .distance(&[0.0, 0.0], &[1.0, 0.0])
            .unwrap();
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = DistanceMetric::SquaredEuclidean
            .distance(&[0.0], &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, LibrisError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_parse_roundtrip() {
        for metric in [
            DistanceMetric::SquaredEuclidean,
            DistanceMetric::Euclidean,
            DistanceMetric::Cosine,
            DistanceMetric::DotProduct,
        ] {
            assert_eq!(DistanceMetric::parse_str(metric.name()).unwrap(), metric);
        }
        assert!(DistanceMetric::parse_str("hamming").is_err());
    }

    #[test]
    fn test_batch_distance_parallel() {
        let query = [0.0f32, 0.0];
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 2.0];
        let distances = DistanceMetric::SquaredEuclidean
            .batch_distance_parallel(&query, &[&a, &b])
            .unwrap();
        assert_eq!(distances, vec![1.0, 4.0]);
    }
}
