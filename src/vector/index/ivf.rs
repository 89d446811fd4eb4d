//! IVF (Inverted File) index: a k-means coarse quantizer plus inverted lists.

pub mod builder;
pub mod searcher;
pub mod snapshot;
