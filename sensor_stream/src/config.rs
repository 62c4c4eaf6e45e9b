//! Pipeline configuration
//!
//! Defaults follow the classic sensor example: 10 second resampling rounded
//! to the second, EMAs over one and ten minutes, and a one minute (6 tick)
//! prediction horizon.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stream_math::{AggregationType, Interpolation, RoundStart};

/// A derived feature computed from the raw readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureConfig {
    /// Time-weighted exponential moving average
    Ema {
        /// Readings in the last `interval_ms` carry ~90% of the weight
        interval_ms: i64,
        /// History averaged to seed the EMA
        #[serde(default = "default_init_window_ms")]
        init_window_ms: i64,
    },
    /// Mean of the readings in the last `window_ms`
    MovingAverage { window_ms: i64 },
}

fn default_init_window_ms() -> i64 {
    10_000
}

impl FeatureConfig {
    /// Short column name, e.g. `ema_60s`
    pub fn name(&self) -> String {
        match self {
            FeatureConfig::Ema { interval_ms, .. } => format!("ema_{}", format_span(*interval_ms)),
            FeatureConfig::MovingAverage { window_ms } => format!("ma_{}", format_span(*window_ms)),
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            FeatureConfig::Ema {
                interval_ms,
                init_window_ms,
            } => {
                if interval_ms <= 0 || init_window_ms < 0 {
                    return Err(PipelineError::InvalidParameter(format!(
                        "EMA interval must be positive and init window non-negative, got {} / {}",
                        interval_ms, init_window_ms
                    )));
                }
            }
            FeatureConfig::MovingAverage { window_ms } => {
                if window_ms <= 0 {
                    return Err(PipelineError::InvalidParameter(format!(
                        "Moving average window must be positive, got {}",
                        window_ms
                    )));
                }
            }
        }
        Ok(())
    }
}

fn format_span(ms: i64) -> String {
    if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{}ms", ms)
    }
}

/// What to do with a reading older than the last accepted one, or one
/// past the gap limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfOrderPolicy {
    /// Fail the `process` call
    #[default]
    Reject,
    /// Log a warning and drop the reading
    Skip,
}

/// Configuration of the whole cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output cadence of the resampler
    pub resample_interval_ms: i64,
    /// Alignment of the first bucket
    pub round_start: RoundStart,
    /// Aggregation inside a bucket
    pub aggregation: AggregationType,
    /// Interpolation used for empty buckets and by the EMAs
    pub interpolation: Interpolation,
    /// Derived features, in output order
    pub features: Vec<FeatureConfig>,
    /// Lag, in ticks, between a record's features and the value they predict
    pub window: usize,
    /// Extra ticks of training before predictions start
    pub warmup: usize,
    /// Recursive least squares forgetting factor in (0, 1]
    pub forget_factor: f64,
    /// Recursive least squares regularization
    pub regularization: f64,
    /// Handling of out-of-order readings and readings past `max_gap_ticks`
    pub out_of_order: OutOfOrderPolicy,
    /// Most ticks a single reading may close, gap filling included
    pub max_gap_ticks: u64,
    /// Records kept in memory; never fewer than `window + 1`
    pub history_capacity: usize,
    /// Evaluations per block when tracking error over time
    pub error_block: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resample_interval_ms: 10_000,
            round_start: RoundStart::Second,
            aggregation: AggregationType::Avg,
            interpolation: Interpolation::Previous,
            features: vec![
                FeatureConfig::Ema {
                    interval_ms: 60_000,
                    init_window_ms: 10_000,
                },
                FeatureConfig::Ema {
                    interval_ms: 600_000,
                    init_window_ms: 10_000,
                },
            ],
            window: 6,
            warmup: 10,
            forget_factor: 1.0,
            regularization: 1.0,
            out_of_order: OutOfOrderPolicy::Reject,
            max_gap_ticks: 100_000,
            history_capacity: 0,
            error_block: 100,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.resample_interval_ms <= 0 {
            return Err(PipelineError::InvalidParameter(
                "Resample interval must be positive".to_string(),
            ));
        }
        if self.window == 0 {
            return Err(PipelineError::InvalidParameter(
                "Window must be at least one tick".to_string(),
            ));
        }
        if !(self.forget_factor > 0.0 && self.forget_factor <= 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Forget factor must be in (0, 1], got {}",
                self.forget_factor
            )));
        }
        if !(self.regularization > 0.0 && self.regularization.is_finite()) {
            return Err(PipelineError::InvalidParameter(format!(
                "Regularization must be positive, got {}",
                self.regularization
            )));
        }
        if self.max_gap_ticks == 0 {
            return Err(PipelineError::InvalidParameter(
                "Gap limit must allow at least one tick".to_string(),
            ));
        }
        if self.error_block == 0 {
            return Err(PipelineError::InvalidParameter(
                "Error block must be at least one evaluation".to_string(),
            ));
        }
        for feature in &self.features {
            feature.validate()?;
        }
        Ok(())
    }

    /// Dimension of the learner input: the value plus every derived feature
    pub fn feature_dim(&self) -> usize {
        1 + self.features.len()
    }

    /// Records the history has to keep
    pub fn effective_history(&self) -> usize {
        self.history_capacity.max(self.window + 1)
    }

    /// Column names of the learner input
    pub fn feature_names(&self) -> Vec<String> {
        std::iter::once("value".to_string())
            .chain(self.features.iter().map(FeatureConfig::name))
            .collect()
    }
}
