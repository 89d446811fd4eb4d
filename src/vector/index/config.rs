//! Configuration types for the IVF index.

use serde::{Deserialize, Serialize};

use crate::error::{LibrisError, Result};
use crate::vector::DistanceMetric;

/// Build parameters for an IVF index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvfBuildConfig {
    /// Number of centroids (inverted lists). Clamped to the number of vectors.
    pub nlist: usize,
    /// Default number of lists scanned per query.
    pub nprobe: usize,
    /// Distance metric used for training, assignment and ranking.
    pub metric: DistanceMetric,
    /// Expected vector dimension. `None` accepts the first vector's dimension.
    pub dimension: Option<usize>,
    /// Maximum Lloyd iterations during k-means training.
    pub max_iterations: usize,
    /// Mean centroid movement below which training stops.
    pub convergence_threshold: f32,
    /// Seed for k-means++ initialization. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Assign vectors to centroids with rayon.
    pub parallel_build: bool,
}

impl Default for IvfBuildConfig {
    fn default() -> Self {
        Self {
            nlist: 100,
            nprobe: 10,
            metric: DistanceMetric::SquaredEuclidean,
            dimension: None,
            max_iterations: 100,
            convergence_threshold: 1e-6,
            seed: Some(42),
            parallel_build: true,
        }
    }
}

impl IvfBuildConfig {
    /// Override `nlist` and `nprobe`.
    pub fn with_ivf_params(mut self, nlist: usize, nprobe: usize) -> Self {
        self.nlist = nlist;
        self.nprobe = nprobe;
        self
    }

    /// Set the k-means seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the parameters for values no build could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.nlist == 0 {
            return Err(LibrisError::invalid_config("nlist must be at least 1"));
        }
        if self.nprobe == 0 {
            return Err(LibrisError::invalid_config("nprobe must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(LibrisError::invalid_config(
                "max_iterations must be at least 1",
            ));
        }
        if self.dimension == Some(0) {
            return Err(LibrisError::invalid_config("dimension must be positive"));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(LibrisError::invalid_config(
                "convergence_threshold must be a non-negative number",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(IvfBuildConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_params_rejected() {
        let config = IvfBuildConfig::default().with_ivf_params(0, 1);
        assert!(config.validate().is_err());

        let config = IvfBuildConfig::default().with_ivf_params(4, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IvfBuildConfig = serde_json::from_str(r#"{"nlist": 8}"#).unwrap();
        assert_eq!(config.nlist, 8);
        assert_eq!(config.nprobe, 10);
        assert_eq!(config.metric, DistanceMetric::SquaredEuclidean);
    }
}
