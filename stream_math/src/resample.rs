//! Fixed-cadence resampling of irregular readings
//!
//! Readings are grouped into buckets `[start, start + interval)`. A bucket is
//! closed and emitted when the first reading at or past its end arrives.
//! Buckets that received no readings are filled by interpolating between the
//! readings on either side of the gap, so the output never skips a tick.
//! A limit on the buckets one reading may close keeps a bogus far-future
//! timestamp from expanding into millions of filled buckets.

use crate::{Interpolation, MathError, Millis, Result};
use serde::{Deserialize, Serialize};

/// Aggregation applied to the readings of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    #[default]
    Avg,
    Sum,
    Min,
    Max,
}

/// Alignment of the first bucket start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStart {
    /// Start at the first reading's timestamp
    #[serde(alias = "none")]
    Unaligned,
    /// Floor to a whole second
    #[default]
    Second,
    /// Floor to a whole minute
    Minute,
    /// Floor to a whole hour
    Hour,
}

impl RoundStart {
    /// Floor `timestamp` to this alignment
    pub fn floor(&self, timestamp: Millis) -> Millis {
        let unit = match self {
            RoundStart::Unaligned => return timestamp,
            RoundStart::Second => 1_000,
            RoundStart::Minute => 60_000,
            RoundStart::Hour => 3_600_000,
        };
        timestamp - timestamp.rem_euclid(unit)
    }
}

/// One emitted bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampled {
    /// Bucket start
    pub start: Millis,
    /// Aggregated (or interpolated) value
    pub value: f64,
    /// True when the bucket had no readings and was interpolated
    pub filled: bool,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn value(&self, aggregation: AggregationType) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match aggregation {
            AggregationType::Avg => self.sum / self.count as f64,
            AggregationType::Sum => self.sum,
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
        })
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Resampler producing one value per `interval` milliseconds
#[derive(Debug, Clone)]
pub struct Resampler {
    interval: Millis,
    aggregation: AggregationType,
    round_start: RoundStart,
    interpolation: Interpolation,
    bucket_start: Option<Millis>,
    bucket: Accumulator,
    last: Option<(Millis, f64)>,
    max_gap: Option<u64>,
}

impl Resampler {
    /// Create a new resampler
    pub fn new(
        interval: Millis,
        aggregation: AggregationType,
        round_start: RoundStart,
        interpolation: Interpolation,
    ) -> Result<Self> {
        if interval <= 0 {
            return Err(MathError::InvalidInput(
                "Resample interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            interval,
            aggregation,
            round_start,
            interpolation,
            bucket_start: None,
            bucket: Accumulator::default(),
            last: None,
            max_gap: None,
        })
    }

    /// Refuse readings that would close more than `ticks` buckets at once
    pub fn with_max_gap(mut self, ticks: u64) -> Self {
        self.max_gap = Some(ticks);
        self
    }

    /// Add a reading and return every bucket it closed, oldest first
    pub fn update(&mut self, timestamp: Millis, value: f64) -> Result<Vec<Resampled>> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Non-finite value {} at {}",
                value, timestamp
            )));
        }
        if let Some((last, _)) = self.last {
            if timestamp < last {
                return Err(MathError::OutOfOrder {
                    last,
                    got: timestamp,
                });
            }
        }

        let mut start = self
            .bucket_start
            .unwrap_or_else(|| self.round_start.floor(timestamp));
        if let Some(limit) = self.max_gap {
            let ticks = (timestamp - start).div_euclid(self.interval).max(0) as u64;
            if ticks > limit {
                return Err(MathError::GapTooLarge {
                    got: timestamp,
                    ticks,
                    limit,
                });
            }
        }
        let mut closed = Vec::new();

        while timestamp >= start + self.interval {
            match self.bucket.value(self.aggregation) {
                Some(aggregated) => closed.push(Resampled {
                    start,
                    value: aggregated,
                    filled: false,
                }),
                None => {
                    // The first bucket always holds the first reading, so a
                    // gap always has a reading before it
                    let before = self.last.ok_or_else(|| {
                        MathError::CalculationError("Empty bucket without history".to_string())
                    })?;
                    closed.push(Resampled {
                        start,
                        value: self
                            .interpolation
                            .value_at(before, (timestamp, value), start),
                        filled: true,
                    });
                }
            }
            self.bucket.clear();
            start += self.interval;
        }

        self.bucket_start = Some(start);
        self.bucket.add(value);
        self.last = Some((timestamp, value));

        Ok(closed)
    }

    /// Aggregate of the bucket still being filled
    pub fn pending(&self) -> Option<Resampled> {
        let start = self.bucket_start?;
        self.bucket.value(self.aggregation).map(|value| Resampled {
            start,
            value,
            filled: false,
        })
    }

    pub fn max_gap(&self) -> Option<u64> {
        self.max_gap
    }

    /// Get the output interval in milliseconds
    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn aggregation(&self) -> AggregationType {
        self.aggregation
    }

    /// Reset the resampler, dropping the open bucket and history
    pub fn reset(&mut self) {
        self.bucket_start = None;
        self.bucket.clear();
        self.last = None;
    }
}
