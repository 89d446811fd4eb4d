//! Shared utility modules used across Libris components.

pub mod simd;
