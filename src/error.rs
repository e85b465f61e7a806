//! Error types for descriptor sets

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for descriptor set operations
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Error types that can occur in descriptor set operations
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Unsupported index: {0}")]
    UnsupportedIndex(String),

    #[error("Open failed for {}: {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Object not found: position {position} (count={count})")]
    ObjectNotFound { position: i64, count: usize },

    #[error("Dimension mismatch: {values} values do not split into rows of {dimension}")]
    DimensionMismatch { dimension: usize, values: usize },

    #[error("Invalid dimension: {0}")]
    InvalidDimension(usize),

    #[error("Index not trained")]
    NotTrained,

    #[error("Empty descriptor batch")]
    EmptyBatch,

    #[error("Invalid label {id}: {reason}")]
    InvalidLabel { id: i64, reason: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DescriptorError {
    pub(crate) fn open_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DescriptorError::OpenFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
