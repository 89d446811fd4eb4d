//! Top-level configuration.
//!
//! Every section has defaults, so a config file only needs the values it
//! changes:
//!
//! ```
//! use libris::config::LibrisConfig;
//!
//! let config: LibrisConfig = serde_json::from_str(
//!     r#"{ "index": { "nlist": 64, "nprobe": 8 }, "aggregator": { "seed": 7 } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.index.nlist, 64);
//! assert_eq!(config.encoder.text_dimension, 384);
//! config.validate().unwrap();
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embedding::EncoderConfig;
use crate::error::{LibrisError, Result};
use crate::recommend::{AggregatorConfig, ServiceConfig};
use crate::vector::index::IvfBuildConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrisConfig {
    pub encoder: EncoderConfig,
    pub index: IvfBuildConfig,
    pub aggregator: AggregatorConfig,
    pub service: ServiceConfig,
}

impl LibrisConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            LibrisError::invalid_config(format!("cannot open {}: {e}", path.display()))
        })?;
        let config: LibrisConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;
        self.index.validate()?;
        self.aggregator.validate()?;
        self.service.validate()?;

        let encoded = self.encoder.text_dimension + 1;
        if let Some(dimension) = self.index.dimension
            && dimension != encoded
        {
            return Err(LibrisError::invalid_config(format!(
                "index dimension {dimension} does not match encoded dimension {encoded}"
            )));
        }
        Ok(())
    }

    /// Index parameters with the dimension pinned to the encoder's output.
    pub fn resolved_index_config(&self) -> IvfBuildConfig {
        IvfBuildConfig {
            dimension: Some(self.encoder.text_dimension + 1),
            ..self.index.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::recommend::SelectionPolicy;

    #[test]
    fn test_defaults_are_valid() {
        LibrisConfig::default().validate().unwrap();
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "encoder": {{ "text_dimension": 64 }},
                "aggregator": {{ "policy": "ranked", "per_item_k": 5 }},
                "service": {{ "recommend_timeout_ms": 250 }}
            }}"#
        )
        .unwrap();

        let config = LibrisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.encoder.text_dimension, 64);
        assert_eq!(config.encoder.year.base_year, 1900);
        assert_eq!(config.aggregator.policy, SelectionPolicy::Ranked);
        assert_eq!(config.aggregator.per_item_k, 5);
        assert_eq!(config.service.recommend_timeout_ms, 250);
        assert_eq!(config.index.nlist, 100);
        assert_eq!(config.resolved_index_config().dimension, Some(65));
    }

    #[test]
    fn test_missing_file() {
        let err = LibrisConfig::from_json_file("/nonexistent/libris.json").unwrap_err();
        assert!(matches!(err, LibrisError::InvalidArgument(_)));
    }

    #[test]
    fn test_dimension_must_agree() {
        let mut config = LibrisConfig::default();
        config.index.dimension = Some(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let mut config = LibrisConfig::default();
        config.service.embedding_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = LibrisConfig::default();
        config.encoder.year.max_year = config.encoder.year.base_year;
        assert!(config.validate().is_err());
    }
}
