//! # Stream Math
//!
//! Streaming aggregates for irregularly sampled time series.
//! This crate provides the numeric building blocks used by the sensor
//! pipeline:
//!
//! - Time-weighted exponential moving average ([`moving_averages::TimeEma`])
//! - Time-windowed moving average ([`moving_averages::WindowedAverage`])
//! - Fixed-cadence resampling ([`resample::Resampler`])
//! - Recursive least squares regression ([`regression::RecursiveLinearRegression`])
//!
//! Timestamps are plain milliseconds (`i64`) so that callers can map them
//! from whatever clock type they use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod moving_averages;
pub mod regression;
pub mod resample;

pub use moving_averages::{TimeEma, WindowedAverage};
pub use regression::RecursiveLinearRegression;
pub use resample::{AggregationType, Resampled, Resampler, RoundStart};

/// Timestamp in milliseconds
pub type Millis = i64;

/// Errors that can occur in streaming calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timestamp {got} is older than the last accepted timestamp {last}")]
    OutOfOrder { last: Millis, got: Millis },

    #[error("Timestamp {got} would close {ticks} buckets, more than the limit of {limit}")]
    GapTooLarge { got: Millis, ticks: u64, limit: u64 },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for streaming math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// How a value is assumed to move between two observed readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Hold the previous reading until the next one arrives
    #[default]
    Previous,
    /// The next reading was already in effect over the gap
    Next,
    /// Straight line between the two readings
    Linear,
}

impl Interpolation {
    /// Value at time `t` given the readings around it.
    ///
    /// `before` is the last reading at or before `t`, `after` the first
    /// reading after it.
    pub fn value_at(&self, before: (Millis, f64), after: (Millis, f64), t: Millis) -> f64 {
        match self {
            Interpolation::Previous => before.1,
            Interpolation::Next => after.1,
            Interpolation::Linear => {
                let span = (after.0 - before.0) as f64;
                if span <= 0.0 {
                    return after.1;
                }
                let frac = ((t - before.0) as f64 / span).clamp(0.0, 1.0);
                before.1 + (after.1 - before.1) * frac
            }
        }
    }
}
