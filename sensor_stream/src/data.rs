//! Readings, clean records and ingestion sources

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single time-stamped scalar reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Time the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Check that the reading can be ingested
    pub fn validate(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(PipelineError::InvalidReading(format!(
                "non-finite value {} at {}",
                self.value, self.timestamp
            )));
        }
        Ok(())
    }

    /// Timestamp in milliseconds since the epoch
    pub fn millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// One fixed-cadence record produced by the feature aggregator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    /// Dense sequence index, starting at 0
    pub id: u64,
    /// Start of the resample bucket
    pub timestamp: DateTime<Utc>,
    /// Resampled value
    pub value: f64,
    /// Derived features, in configuration order
    pub features: Vec<f64>,
    /// Prediction made from this record, targeting the record `window` ticks later
    pub prediction: Option<f64>,
    /// True when the bucket had no readings and its value was interpolated
    pub interpolated: bool,
}

impl CleanRecord {
    /// Learner input for this record: the value followed by the derived features
    pub fn feature_vector(&self) -> Vec<f64> {
        let mut vector = Vec::with_capacity(self.features.len() + 1);
        vector.push(self.value);
        vector.extend_from_slice(&self.features);
        vector
    }
}

/// Convert milliseconds since the epoch to a UTC timestamp
pub fn datetime_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| PipelineError::DataError(format!("timestamp {} out of range", millis)))
}

/// Load readings from a CSV file
///
/// The expected CSV format is:
/// timestamp,value
/// 2023-01-01T09:30:00Z,100.5
///
/// Rows are returned in file order; ordering is enforced by the pipeline.
pub fn load_readings_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Reading>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut readings = Vec::new();

    for (i, row) in reader.deserialize::<Reading>().enumerate() {
        let reading = row?;
        reading.validate().map_err(|e| {
            PipelineError::DataError(format!("line {}: {}", i + 2, e))
        })?;
        readings.push(reading);
    }

    if readings.is_empty() {
        return Err(PipelineError::DataError(
            "No readings found in file".to_string(),
        ));
    }

    Ok(readings)
}

/// Readings of `sin(t)` with `t` in seconds since `start`
pub fn sine_wave(start: DateTime<Utc>, step: Duration, count: usize) -> Vec<Reading> {
    let step_secs = step.num_milliseconds() as f64 / 1_000.0;
    (0..count)
        .map(|i| {
            let timestamp = start + step * i as i32;
            Reading::new(timestamp, (i as f64 * step_secs).sin())
        })
        .collect()
}

/// Generate an irregularly spaced Brownian motion for testing
///
/// # Arguments
/// * `start` - Timestamp of the first reading
/// * `count` - Number of readings
/// * `mean_step_ms` - Mean spacing between readings (exponentially distributed)
/// * `volatility` - Standard deviation of the increment over one second
/// * `seed` - Seed for reproducible output
pub fn brownian_motion(
    start: DateTime<Utc>,
    count: usize,
    mean_step_ms: f64,
    volatility: f64,
    seed: u64,
) -> Result<Vec<Reading>> {
    if mean_step_ms <= 0.0 {
        return Err(PipelineError::InvalidParameter(
            "Mean step must be positive".to_string(),
        ));
    }
    let spacing = Exp::new(1.0 / mean_step_ms)
        .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;
    let noise =
        Normal::new(0.0, volatility).map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut readings = Vec::with_capacity(count);
    let mut timestamp = start;
    let mut value = 0.0;

    for i in 0..count {
        if i > 0 {
            let step_ms = spacing.sample(&mut rng).max(1.0);
            timestamp += Duration::milliseconds(step_ms as i64);
            value += noise.sample(&mut rng) * (step_ms / 1_000.0).sqrt();
        }
        readings.push(Reading::new(timestamp, value));
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_reading_validation() {
        assert!(Reading::new(epoch(), 1.0).validate().is_ok());
        assert!(Reading::new(epoch(), f64::NAN).validate().is_err());
        assert!(Reading::new(epoch(), f64::NEG_INFINITY).validate().is_err());
    }

    #[test]
    fn test_feature_vector_layout() {
        let record = CleanRecord {
            id: 0,
            timestamp: epoch(),
            value: 1.0,
            features: vec![2.0, 3.0],
            prediction: None,
            interpolated: false,
        };
        assert_eq!(record.feature_vector(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sine_wave() {
        let readings = sine_wave(epoch(), Duration::seconds(1), 4);
        assert_eq!(readings.len(), 4);
        assert_eq!(readings[3].timestamp, epoch() + Duration::seconds(3));
        assert!((readings[3].value - 3.0_f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_brownian_motion_is_ordered_and_reproducible() {
        let a = brownian_motion(epoch(), 500, 700.0, 1.0, 7).unwrap();
        let b = brownian_motion(epoch(), 500, 700.0, 1.0, 7).unwrap();

        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(a.iter().all(|r| r.value.is_finite()));
    }

    #[test]
    fn test_datetime_from_millis() {
        assert_eq!(
            datetime_from_millis(epoch().timestamp_millis()).unwrap(),
            epoch()
        );
    }
}
