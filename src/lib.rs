//! # Libris
//!
//! Content-based book recommendations.
//!
//! Items are encoded into fixed-length vectors (a text embedding of title,
//! authors and subjects plus a normalized publication year), stored per item,
//! indexed with an inverted-file (IVF) index for approximate nearest-neighbour
//! search, and aggregated into per-user recommendations from their favorites.
//!
//! ## Modules
//!
//! - [`embedding`]: text embedders and the feature encoder
//! - [`store`]: embedding persistence
//! - [`vector`]: vectors, distances and the IVF index
//! - [`recommend`]: the aggregator and the service facade
//! - [`catalog`]: read access to items and favorites

pub mod catalog;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod recommend;
pub mod store;
pub mod util;
pub mod vector;

pub mod prelude {
    pub use crate::catalog::{Item, ItemCatalog, ItemSummary, MemoryCatalog};
    pub use crate::config::LibrisConfig;
    pub use crate::embedding::{FeatureEncoder, HashingTextEmbedder, TextEmbedder};
    pub use crate::error::{LibrisError, Result};
    pub use crate::recommend::{RecommendationAggregator, RecommendationService};
    pub use crate::store::{EmbeddingStore, FileEmbeddingStore, MemoryEmbeddingStore};
    pub use crate::vector::Vector;
    pub use crate::vector::index::{IndexManager, IvfBuildConfig, SearchParams};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
