//! Error types for the text_mining crate

use thiserror::Error;

/// Errors raised while building feature spaces or training classifiers
#[derive(Debug, Error)]
pub enum TextError {
    /// A feature space or classifier needs at least one document
    #[error("Empty corpus")]
    EmptyCorpus,

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Sizes of matrices, vectors or labels do not line up
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Error related to data loading
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON parsing
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, TextError>;
