//! Turning catalog items into fixed-length vectors.
//!
//! The semantic part of an item's vector comes from a [`TextEmbedder`], an
//! external text-encoding collaborator. Libris ships two implementations:
//!
//! - [`HashingTextEmbedder`]: deterministic feature hashing, no model required
//! - [`LazyTextEmbedder`]: defers constructing an expensive embedder until the
//!   first text is encoded
//!
//! [`FeatureEncoder`] combines the text embedding with a normalized publish
//! year into the `D+1` dimensional vector stored for each item.
//!
//! # Custom Implementation
//!
//! ```
//! use async_trait::async_trait;
//! use libris::embedding::TextEmbedder;
//! use libris::error::Result;
//! use libris::vector::Vector;
//!
//! struct MyEmbedder {
//!     dimension: usize,
//! }
//!
//! #[async_trait]
//! impl TextEmbedder for MyEmbedder {
//!     async fn embed(&self, text: &str) -> Result<Vector> {
//!         Ok(Vector::new(vec![text.len() as f32; self.dimension]))
//!     }
//!
//!     fn dimension(&self) -> usize {
//!         self.dimension
//!     }
//! }
//! ```

pub mod encoder;
pub mod hashing;
pub mod lazy;
pub mod text_embedder;

pub use self::encoder::{EncoderConfig, FeatureEncoder, YearNormalization};
pub use self::hashing::HashingTextEmbedder;
pub use self::lazy::LazyTextEmbedder;
pub use self::text_embedder::TextEmbedder;
