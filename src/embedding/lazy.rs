//! Lazily initialized text embedder.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use crate::embedding::text_embedder::TextEmbedder;
use crate::error::{LibrisError, Result};
use crate::vector::Vector;

type Loader = Arc<dyn Fn() -> Result<Arc<dyn TextEmbedder>> + Send + Sync>;

/// Wraps an embedder whose construction is expensive (e.g. loading model
/// weights) and defers it until the first call to [`TextEmbedder::embed`] or
/// [`LazyTextEmbedder::initialize`].
///
/// The loader runs at most once, on tokio's blocking pool. If it fails the
/// error is returned and the next call retries. The declared dimension must
/// match what the loaded embedder reports.
pub struct LazyTextEmbedder {
    name: String,
    dimension: usize,
    loader: Loader,
    inner: OnceCell<Arc<dyn TextEmbedder>>,
}

impl LazyTextEmbedder {
    pub fn new<S, F>(name: S, dimension: usize, loader: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> Result<Arc<dyn TextEmbedder>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dimension,
            loader: Arc::new(loader),
            inner: OnceCell::new(),
        }
    }

    /// Whether the wrapped embedder has been constructed.
    pub fn is_ready(&self) -> bool {
        self.inner.initialized()
    }

    /// Construct the wrapped embedder now if it is not ready yet.
    pub async fn initialize(&self) -> Result<Arc<dyn TextEmbedder>> {
        let embedder = self
            .inner
            .get_or_try_init(|| async {
                let loader = self.loader.clone();
                let embedder = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| {
                        LibrisError::embedding(format!("embedder loader panicked: {e}"))
                    })??;

                if embedder.dimension() != self.dimension {
                    return Err(LibrisError::dimension_mismatch(
                        format!("embedder {}", self.name),
                        self.dimension,
                        embedder.dimension(),
                    ));
                }
                info!(embedder = %self.name, dimension = self.dimension, "text embedder ready");
                Ok::<_, LibrisError>(embedder)
            })
            .await?;
        Ok(embedder.clone())
    }
}

impl fmt::Debug for LazyTextEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTextEmbedder")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[async_trait]
impl TextEmbedder for LazyTextEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        self.initialize().await?.embed(text).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }
}
