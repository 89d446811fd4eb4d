//! Error types for the Libris library.
//!
//! All fallible operations return [`LibrisError`] through the crate-wide
//! [`Result`] alias.
//!
//! # Examples
//!
//! ```
//! use libris::error::{LibrisError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LibrisError::invalid_argument("limit must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Libris operations.
///
/// Build-time variants (`EmptyTrainingSet`, `DimensionMismatch`, `InvalidVector`)
/// abort the build they occur in but never touch the snapshot currently being
/// served. `IndexNotReady` and `MissingEmbedding` are recoverable and are absorbed
/// by the recommendation path.
#[derive(Error, Debug)]
pub enum LibrisError {
    /// An index build was attempted with zero embeddings.
    #[error("Cannot build index: training set is empty")]
    EmptyTrainingSet,

    /// Vectors with inconsistent lengths were mixed.
    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A vector contains NaN or infinite values.
    #[error("Invalid vector for {0}: contains NaN or infinity")]
    InvalidVector(String),

    /// A search was attempted before any snapshot was published.
    #[error("Index is not ready: no snapshot has been built")]
    IndexNotReady,

    /// No embedding is stored for the given item.
    #[error("No embedding stored for item {0}")]
    MissingEmbedding(String),

    /// The text-encoding collaborator failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A caller supplied an invalid argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A persisted index failed validation.
    #[error("Corrupt index file: {0}")]
    CorruptIndex(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with LibrisError.
pub type Result<T> = std::result::Result<T, LibrisError>;

impl LibrisError {
    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch<S: Into<String>>(context: S, expected: usize, actual: usize) -> Self {
        LibrisError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        LibrisError::Embedding(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LibrisError::NotFound(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        LibrisError::Timeout(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LibrisError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LibrisError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new corrupt index error.
    pub fn corrupt_index<S: Into<String>>(msg: S) -> Self {
        LibrisError::CorruptIndex(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LibrisError::Other(msg.into())
    }

    /// Whether this error is a build-time failure that leaves the serving
    /// snapshot untouched.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            LibrisError::EmptyTrainingSet
                | LibrisError::DimensionMismatch { .. }
                | LibrisError::InvalidVector(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LibrisError::not_found("OL1W");
        assert_eq!(error.to_string(), "Not found: OL1W");

        let error = LibrisError::dimension_mismatch("item OL2W", 3, 2);
        assert_eq!(
            error.to_string(),
            "Dimension mismatch for item OL2W: expected 3, got 2"
        );

        let error = LibrisError::invalid_config("nlist must be positive");
        assert_eq!(
            error.to_string(),
            "Invalid argument: Invalid configuration: nlist must be positive"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let libris_error = LibrisError::from(io_error);

        match libris_error {
            LibrisError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_build_error_classification() {
        assert!(LibrisError::EmptyTrainingSet.is_build_error());
        assert!(LibrisError::dimension_mismatch("x", 1, 2).is_build_error());
        assert!(!LibrisError::IndexNotReady.is_build_error());
        assert!(!LibrisError::MissingEmbedding("OL1W".into()).is_build_error());
    }
}
