//! Error types for the sensor_stream crate

use chrono::{DateTime, Utc};
use stream_math::MathError;
use thiserror::Error;

/// Errors raised while ingesting readings or running the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading that cannot be ingested (non-finite value)
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Reading older than the last accepted one
    #[error("Out-of-order reading: {got} is older than the last accepted {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    /// Reading so far past the last one that it would close too many ticks
    #[error("Reading at {at} would close {ticks} ticks, more than the limit of {limit}")]
    GapTooLarge {
        at: DateTime<Utc>,
        ticks: u64,
        limit: u64,
    },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data loading or bookkeeping
    #[error("Data error: {0}")]
    DataError(String),

    /// The reading feed was closed by the other side
    #[error("Feed closed")]
    FeedClosed,

    /// Error from the streaming aggregates or the learner
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON configuration parsing
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;
