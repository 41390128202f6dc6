//! Error types for encoding operations.

use thiserror::Error;

/// Error type for hierarchical encoding operations.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Invalid constructor or configuration argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Length mismatch between features, target, or frame columns.
    #[error("Shape mismatch: expected {expected} rows, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    /// The encoder was used before a successful `fit`.
    #[error("Encoder is not fitted: call `fit` before reading or transforming")]
    NotFitted,
    /// An aggregate or smoothing function violated its contract.
    #[error("Aggregation error: {0}")]
    AggregationError(String),
    /// An internal invariant of the cascading transform was violated.
    #[error("Transform integrity error: {0}")]
    TransformIntegrityError(String),
    /// A required column is absent from the frame.
    #[error("Missing column: {0}")]
    MissingColumn(String),
    /// A column holds values that cannot be used the requested way.
    #[error("Column '{column}' has an invalid type: expected {expected}")]
    InvalidColumnType { column: String, expected: String },
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;

impl From<std::io::Error> for EncodingError {
    fn from(err: std::io::Error) -> Self {
        EncodingError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for EncodingError {
    fn from(err: bincode::Error) -> Self {
        EncodingError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(err: serde_json::Error) -> Self {
        EncodingError::SerializationError(err.to_string())
    }
}
