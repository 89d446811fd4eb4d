//! Ownership and publication of the current IVF snapshot.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{info, warn};

use crate::error::{LibrisError, Result};
use crate::vector::Vector;
use crate::vector::index::config::IvfBuildConfig;
use crate::vector::index::io;
use crate::vector::index::ivf::builder::IvfIndexBuilder;
use crate::vector::index::ivf::searcher::{SearchHit, SearchParams};
use crate::vector::index::ivf::snapshot::{IndexStats, IvfIndex};

/// Holds the snapshot currently being served.
///
/// Readers take an `Arc` to the snapshot and keep using it even if a rebuild
/// publishes a replacement meanwhile. A build that fails leaves the current
/// snapshot (or the "not ready" state) untouched.
#[derive(Debug)]
pub struct IndexManager {
    builder: IvfIndexBuilder,
    current: ArcSwapOption<IvfIndex>,
}

impl IndexManager {
    pub fn new(config: IvfBuildConfig) -> Result<Self> {
        Ok(Self {
            builder: IvfIndexBuilder::new(config)?,
            current: ArcSwapOption::empty(),
        })
    }

    pub fn config(&self) -> &IvfBuildConfig {
        self.builder.config()
    }

    /// Build a snapshot with the configured parameters and publish it.
    pub fn build(&self, embeddings: Vec<(String, Vector)>) -> Result<Arc<IvfIndex>> {
        self.publish_result(self.builder.build(embeddings))
    }

    /// Build with explicit parameters for this build only.
    pub fn build_with(
        &self,
        embeddings: Vec<(String, Vector)>,
        config: IvfBuildConfig,
    ) -> Result<Arc<IvfIndex>> {
        let builder = IvfIndexBuilder::new(config)?;
        self.publish_result(builder.build(embeddings))
    }

    fn publish_result(&self, built: Result<IvfIndex>) -> Result<Arc<IvfIndex>> {
        match built {
            Ok(index) => Ok(self.publish(index)),
            Err(e) => {
                warn!(
                    error = %e,
                    invalid_input = e.is_build_error(),
                    ready = self.is_ready(),
                    "index build failed; keeping current snapshot"
                );
                Err(e)
            }
        }
    }

    /// Atomically replace the current snapshot.
    pub fn publish(&self, index: IvfIndex) -> Arc<IvfIndex> {
        let index = Arc::new(index);
        let previous = self.current.swap(Some(index.clone()));
        info!(
            build_id = %index.build_id(),
            replaced = ?previous.map(|p| p.build_id()),
            vectors = index.len(),
            "published index snapshot"
        );
        index
    }

    /// The snapshot currently being served, if any.
    pub fn current(&self) -> Option<Arc<IvfIndex>> {
        self.current.load_full()
    }

    /// The current snapshot, or `IndexNotReady`.
    pub fn snapshot(&self) -> Result<Arc<IvfIndex>> {
        self.current().ok_or(LibrisError::IndexNotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.current().map(|index| index.stats())
    }

    /// Search the current snapshot.
    pub fn search(&self, query: &Vector, params: &SearchParams) -> Result<Vec<SearchHit>> {
        self.snapshot()?.search(query, params)
    }

    /// Persist the current snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        io::save_index(&snapshot, path)
    }

    /// Load a snapshot from `path` and publish it.
    ///
    /// A snapshot whose dimension differs from the configured one is rejected
    /// and the current snapshot stays in place.
    pub fn load(&self, path: &Path) -> Result<Arc<IvfIndex>> {
        let index = io::load_index(path)?;
        if let Some(expected) = self.config().dimension
            && expected != index.dimension()
        {
            return Err(LibrisError::dimension_mismatch(
                format!("index file {}", path.display()),
                expected,
                index.dimension(),
            ));
        }
        Ok(self.publish(index))
    }
}
