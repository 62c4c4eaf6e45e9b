//! Resampling and feature aggregation
//!
//! Every reading updates the resampler and the feature aggregates. Each
//! resample bucket it closes becomes one [`Tick`] carrying the resampled
//! value and the current feature values. Ticks are emitted before the
//! closing reading is folded into the features, so a tick's features only
//! reflect readings from before the end of its bucket.

use crate::config::{FeatureConfig, PipelineConfig};
use crate::data::{datetime_from_millis, Reading};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use stream_math::{Interpolation, MathError, Millis, Resampler, TimeEma, WindowedAverage};
use tracing::{debug, trace};

/// One resampled output of the aggregator, before it gets an id
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub features: Vec<f64>,
    pub interpolated: bool,
}

#[derive(Debug, Clone)]
enum FeatureAggregate {
    Ema(TimeEma),
    MovingAverage(WindowedAverage),
}

impl FeatureAggregate {
    fn from_config(config: &FeatureConfig, interpolation: Interpolation) -> Result<Self> {
        Ok(match *config {
            FeatureConfig::Ema {
                interval_ms,
                init_window_ms,
            } => FeatureAggregate::Ema(TimeEma::new(interval_ms, init_window_ms, interpolation)?),
            FeatureConfig::MovingAverage { window_ms } => {
                FeatureAggregate::MovingAverage(WindowedAverage::new(window_ms)?)
            }
        })
    }

    fn update(&mut self, timestamp: Millis, value: f64) -> Result<()> {
        match self {
            FeatureAggregate::Ema(ema) => ema.update(timestamp, value)?,
            FeatureAggregate::MovingAverage(ma) => ma.update(timestamp, value)?,
        }
        Ok(())
    }

    fn value(&self) -> Option<f64> {
        match self {
            FeatureAggregate::Ema(ema) => ema.value().ok(),
            FeatureAggregate::MovingAverage(ma) => ma.value().ok(),
        }
    }
}

/// Turns raw readings into fixed-cadence ticks with derived features
#[derive(Debug, Clone)]
pub struct FeatureAggregator {
    resampler: Resampler,
    features: Vec<FeatureAggregate>,
    last_timestamp: Option<DateTime<Utc>>,
    suppressed: u64,
}

impl FeatureAggregator {
    /// Create an aggregator from the pipeline configuration
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let resampler = Resampler::new(
            config.resample_interval_ms,
            config.aggregation,
            config.round_start,
            config.interpolation,
        )?
        .with_max_gap(config.max_gap_ticks);
        let features = config
            .features
            .iter()
            .map(|f| FeatureAggregate::from_config(f, config.interpolation))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            resampler,
            features,
            last_timestamp: None,
            suppressed: 0,
        })
    }

    /// Fold one reading in and return the ticks it completed, oldest first.
    ///
    /// Ticks completed while a feature is still warming up are dropped.
    pub fn push(&mut self, reading: &Reading) -> Result<Vec<Tick>> {
        reading.validate()?;
        if let Some(last) = self.last_timestamp {
            if reading.timestamp < last {
                return Err(PipelineError::OutOfOrder {
                    last,
                    got: reading.timestamp,
                });
            }
        }

        let t = reading.millis();
        let closed = self
            .resampler
            .update(t, reading.value)
            .map_err(|e| match e {
                MathError::GapTooLarge { ticks, limit, .. } => PipelineError::GapTooLarge {
                    at: reading.timestamp,
                    ticks,
                    limit,
                },
                other => other.into(),
            })?;

        let mut ticks = Vec::with_capacity(closed.len());
        if !closed.is_empty() {
            match self.current_features() {
                Some(features) => {
                    for bucket in closed {
                        ticks.push(Tick {
                            timestamp: datetime_from_millis(bucket.start)?,
                            value: bucket.value,
                            features: features.clone(),
                            interpolated: bucket.filled,
                        });
                    }
                }
                None => {
                    self.suppressed += closed.len() as u64;
                    trace!(
                        dropped = closed.len(),
                        "features not ready, suppressing ticks"
                    );
                }
            }
        }

        let was_ready = self.is_ready();
        for feature in &mut self.features {
            feature.update(t, reading.value)?;
        }
        if !was_ready && self.is_ready() {
            debug!(at = %reading.timestamp, "all features initialized");
        }

        self.last_timestamp = Some(reading.timestamp);
        Ok(ticks)
    }

    fn current_features(&self) -> Option<Vec<f64>> {
        self.features.iter().map(FeatureAggregate::value).collect()
    }

    /// True once every declared feature can produce a value
    pub fn is_ready(&self) -> bool {
        self.features.iter().all(|f| f.value().is_some())
    }

    /// Ticks dropped during cold start
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Timestamp of the last accepted reading
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }
}
