//! Deterministic feature-hashing text embedder.

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::embedding::text_embedder::TextEmbedder;
use crate::error::{LibrisError, Result};
use crate::vector::Vector;

/// Embeds text by hashing lowercase words into a fixed number of buckets.
///
/// Each word adds `±1` to the bucket selected by its CRC32 hash, the sign taken
/// from the hash's top bit; the result is L2 normalized. Texts sharing words
/// therefore land close together. Empty text yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashingTextEmbedder {
    dimension: usize,
}

impl HashingTextEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(LibrisError::invalid_argument(
                "embedding dimension must be positive",
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_sync(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dimension];
        for word in text.unicode_words() {
            let hash = crc32fast::hash(word.to_lowercase().as_bytes());
            let bucket = (hash as usize) % self.dimension;
            let sign = if hash >> 31 == 0 { 1.0 } else { -1.0 };
            data[bucket] += sign;
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        vector
    }
}

#[async_trait]
impl TextEmbedder for HashingTextEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DistanceMetric;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashingTextEmbedder::new(64).unwrap();
        let a = embedder.embed("The Hobbit J. R. R. Tolkien fantasy").await.unwrap();
        let b = embedder.embed("The Hobbit J. R. R. Tolkien fantasy").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimension(), 64);
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let embedder = HashingTextEmbedder::new(32).unwrap();
        let a = embedder.embed("Dune").await.unwrap();
        let b = embedder.embed("DUNE").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingTextEmbedder::new(16).unwrap();
        let v = embedder.embed("").await.unwrap();
        assert_eq!(v, Vector::zeros(16));
    }

    #[tokio::test]
    async fn test_shared_words_are_closer() {
        let embedder = HashingTextEmbedder::new(256).unwrap();
        let base = embedder.embed("space opera science fiction").await.unwrap();
        let near = embedder.embed("science fiction novel").await.unwrap();
        let far = embedder.embed("victorian cookery household").await.unwrap();

        let metric = DistanceMetric::SquaredEuclidean;
        assert!(
            metric.distance(&base.data, &near.data).unwrap()
                < metric.distance(&base.data, &far.data).unwrap()
        );
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingTextEmbedder::new(0).is_err());
    }
}
