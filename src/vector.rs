//! Dense vectors, distance metrics, and the IVF vector index.
//!
//! # Module Structure
//!
//! - `core`: Core data structures (vector, distance)
//! - `index`: IVF index building, searching, persistence and snapshot management

pub mod core;
pub mod index;

pub use self::core::distance::DistanceMetric;
pub use self::core::vector::Vector;
