//! Moving averages over irregularly spaced readings
//!
//! Contains implementations of:
//! - Time-windowed moving average
//! - Time-weighted exponential moving average (EMA)

use crate::{Interpolation, MathError, Millis, Result};
use std::collections::VecDeque;

/// Moving average over the readings of the last `window` milliseconds
#[derive(Debug, Clone)]
pub struct WindowedAverage {
    window: Millis,
    values: VecDeque<(Millis, f64)>,
    sum: f64,
    first_timestamp: Option<Millis>,
}

impl WindowedAverage {
    /// Create a new windowed average covering `window` milliseconds
    pub fn new(window: Millis) -> Result<Self> {
        if window <= 0 {
            return Err(MathError::InvalidInput(
                "Window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            window,
            values: VecDeque::new(),
            sum: 0.0,
            first_timestamp: None,
        })
    }

    /// Add a reading and drop the ones that fell out of the window
    pub fn update(&mut self, timestamp: Millis, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Non-finite value {} at {}",
                value, timestamp
            )));
        }
        if let Some(&(last, _)) = self.values.back() {
            if timestamp < last {
                return Err(MathError::OutOfOrder {
                    last,
                    got: timestamp,
                });
            }
        }

        self.first_timestamp.get_or_insert(timestamp);
        self.values.push_back((timestamp, value));
        self.sum += value;

        let cutoff = timestamp - self.window;
        while let Some(&(t, old)) = self.values.front() {
            if t > cutoff {
                break;
            }
            self.values.pop_front();
            self.sum -= old;
        }

        Ok(())
    }

    /// True once a full window of history has been observed
    pub fn is_ready(&self) -> bool {
        match (self.first_timestamp, self.values.back()) {
            (Some(first), Some(&(last, _))) => last - first >= self.window,
            _ => false,
        }
    }

    /// Mean of the buffered readings, available as soon as one reading arrived
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Get the current moving average
    pub fn value(&self) -> Result<f64> {
        if !self.is_ready() {
            return Err(MathError::InsufficientData(format!(
                "Need {} ms of history for the moving average",
                self.window
            )));
        }

        self.mean().ok_or_else(|| {
            MathError::InsufficientData("No readings in the window".to_string())
        })
    }

    /// Number of readings currently inside the window
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the window length in milliseconds
    pub fn window(&self) -> Millis {
        self.window
    }

    /// Reset the average, clearing all readings
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.first_timestamp = None;
    }
}

/// Exponential moving average over irregularly spaced readings
///
/// The weight of past readings decays with elapsed time rather than with
/// the number of readings. The decay constant is chosen so that readings
/// from the last `interval` milliseconds account for ~90% of the value.
///
/// Between two readings the series is assumed to follow the configured
/// [`Interpolation`]: held at the previous reading, already at the next
/// reading, or moving linearly between them.
#[derive(Debug, Clone)]
pub struct TimeEma {
    interval: Millis,
    init_window: Millis,
    interpolation: Interpolation,
    tau: f64,
    current_ema: Option<f64>,
    last: Option<(Millis, f64)>,
    first_timestamp: Option<Millis>,
    init_sum: f64,
    init_count: usize,
}

impl TimeEma {
    /// Create a new EMA.
    ///
    /// `init_window` is how much history is averaged to seed the EMA before
    /// it reports a value.
    pub fn new(interval: Millis, init_window: Millis, interpolation: Interpolation) -> Result<Self> {
        if interval <= 0 {
            return Err(MathError::InvalidInput(
                "Interval must be greater than zero".to_string(),
            ));
        }
        if init_window < 0 {
            return Err(MathError::InvalidInput(
                "Init window cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            interval,
            init_window,
            interpolation,
            // exp(-interval / tau) == 0.1
            tau: interval as f64 / std::f64::consts::LN_10,
            current_ema: None,
            last: None,
            first_timestamp: None,
            init_sum: 0.0,
            init_count: 0,
        })
    }

    /// Update the EMA with a new reading
    pub fn update(&mut self, timestamp: Millis, value: f64) -> Result<()> {
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

        match (self.current_ema, self.last) {
            (Some(ema), Some((last_time, last_value))) => {
                let dt = (timestamp - last_time) as f64;
                if dt > 0.0 {
                    let alpha = dt / self.tau;
                    let mu = (-alpha).exp();
                    let nu = match self.interpolation {
                        Interpolation::Previous => 1.0,
                        Interpolation::Next => mu,
                        Interpolation::Linear => (1.0 - mu) / alpha,
                    };
                    self.current_ema =
                        Some(mu * ema + (nu - mu) * last_value + (1.0 - nu) * value);
                }
            }
            _ => {
                // Still seeding: average everything seen in the init window
                let first = *self.first_timestamp.get_or_insert(timestamp);
                self.init_sum += value;
                self.init_count += 1;
                if timestamp - first >= self.init_window {
                    self.current_ema = Some(self.init_sum / self.init_count as f64);
                }
            }
        }

        self.last = Some((timestamp, value));
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.current_ema.is_some()
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        self.current_ema.ok_or_else(|| {
            MathError::InsufficientData(format!(
                "EMA needs {} ms of history before it is initialized",
                self.init_window
            ))
        })
    }

    /// Timestamp of the last reading folded into the EMA
    pub fn last_timestamp(&self) -> Option<Millis> {
        self.last.map(|(t, _)| t)
    }

    /// Get the decay interval in milliseconds
    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Reset the EMA, clearing all state
    pub fn reset(&mut self) {
        self.current_ema = None;
        self.last = None;
        self.first_timestamp = None;
        self.init_sum = 0.0;
        self.init_count = 0;
    }
}
