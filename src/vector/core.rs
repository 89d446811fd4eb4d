//! Core data structures for vector search.
//!
//! This module contains the vector representation and the distance metrics
//! used throughout the index and recommendation code.

pub mod distance;
pub mod vector;
