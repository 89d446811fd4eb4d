//! Feature encoder: text embedding plus normalized publish year.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::embedding::text_embedder::TextEmbedder;
use crate::error::{LibrisError, Result};
use crate::vector::Vector;

/// Affine mapping of a publish year onto `[0, 1]` for the extra feature.
///
/// Years outside `[base_year, max_year]` map outside `[0, 1]`; they are not
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearNormalization {
    pub base_year: i32,
    pub max_year: i32,
}

impl Default for YearNormalization {
    fn default() -> Self {
        Self {
            base_year: 1900,
            max_year: 2025,
        }
    }
}

impl YearNormalization {
    /// `(year - base_year) / (max_year - base_year)`, or `0` without a year.
    pub fn normalize(&self, year: Option<i32>) -> f32 {
        match year {
            Some(year) => {
                let span = f64::from(self.max_year) - f64::from(self.base_year);
                ((f64::from(year) - f64::from(self.base_year)) / span) as f32
            }
            None => 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_year <= self.base_year {
            return Err(LibrisError::invalid_config(format!(
                "max_year ({}) must be greater than base_year ({})",
                self.max_year, self.base_year
            )));
        }
        Ok(())
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Dimension `D` of the text embedding.
    pub text_dimension: usize,
    pub year: YearNormalization,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            text_dimension: 384,
            year: YearNormalization::default(),
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.text_dimension == 0 {
            return Err(LibrisError::invalid_config(
                "text_dimension must be positive",
            ));
        }
        self.year.validate()
    }
}

/// Produces the `D+1` dimensional vector stored for each item.
#[derive(Clone)]
pub struct FeatureEncoder {
    embedder: Arc<dyn TextEmbedder>,
    year: YearNormalization,
}

impl std::fmt::Debug for FeatureEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEncoder")
            .field("embedder", &self.embedder.name())
            .field("dimension", &self.dimension())
            .field("year", &self.year)
            .finish()
    }
}

impl FeatureEncoder {
    pub fn new(embedder: Arc<dyn TextEmbedder>, year: YearNormalization) -> Result<Self> {
        year.validate()?;
        Ok(Self { embedder, year })
    }

    /// Output dimension, `D+1`.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension() + 1
    }

    /// The text handed to the embedder: title, then authors, then subjects,
    /// separated by single spaces.
    pub fn compose_text(title: &str, authors: &[String], subjects: &[String]) -> String {
        format!("{} {} {}", title, authors.join(" "), subjects.join(" "))
    }

    /// Encode an item's descriptive fields.
    ///
    /// An item with no title, authors or subjects still gets a vector: whatever
    /// the embedder returns for blank text, plus the year feature.
    pub async fn encode(
        &self,
        title: &str,
        authors: &[String],
        subjects: &[String],
        publish_year: Option<i32>,
    ) -> Result<Vector> {
        let text = Self::compose_text(title, authors, subjects);
        let mut vector = self.embedder.embed(&text).await?;

        if vector.dimension() != self.embedder.dimension() {
            return Err(LibrisError::embedding(format!(
                "embedder {} returned {} values, declared {}",
                self.embedder.name(),
                vector.dimension(),
                self.embedder.dimension()
            )));
        }

        vector.push(self.year.normalize(publish_year));
        Ok(vector)
    }

    pub async fn encode_item(&self, item: &Item) -> Result<Vector> {
        self.encode(
            &item.title,
            &item.authors,
            &item.subjects,
            item.first_publish_year,
        )
        .await
    }
}
