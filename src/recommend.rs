//! Favorites-based recommendations.
//!
//! [`RecommendationAggregator`] turns a set of favorite items into candidate
//! items by searching the current IVF snapshot once per favorite.
//! [`RecommendationService`] wires the aggregator together with the catalog,
//! the embedding store, the feature encoder and the index manager, and is the
//! surface the rest of an application talks to.

pub mod aggregator;
pub mod service;

pub use self::aggregator::{AggregatorConfig, RecommendationAggregator, SelectionPolicy};
pub use self::service::{
    EmbeddingFailure, EmbeddingReport, RecommendationService, ServiceConfig, SimilarItem,
};
