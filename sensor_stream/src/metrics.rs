//! Error metrics for online evaluation

use crate::error::{PipelineError, Result};
use serde::Serialize;

/// Mean absolute error between two equally long series
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum();
    Ok(sum / predicted.len() as f64)
}

/// Root mean squared error between two equally long series
pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    Ok((sum / predicted.len() as f64).sqrt())
}

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(PipelineError::DataError(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Running error statistics, overall and per block of evaluations
#[derive(Debug, Clone, Serialize)]
pub struct ErrorTracker {
    block_size: usize,
    count: u64,
    abs_sum: f64,
    sq_sum: f64,
    block_abs_sum: f64,
    block_count: usize,
    block_maes: Vec<f64>,
}

impl ErrorTracker {
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(PipelineError::InvalidParameter(
                "Error block must be at least one evaluation".to_string(),
            ));
        }
        Ok(Self {
            block_size,
            count: 0,
            abs_sum: 0.0,
            sq_sum: 0.0,
            block_abs_sum: 0.0,
            block_count: 0,
            block_maes: Vec::new(),
        })
    }

    /// Record one absolute error
    pub fn record(&mut self, abs_error: f64) {
        self.count += 1;
        self.abs_sum += abs_error;
        self.sq_sum += abs_error * abs_error;

        self.block_abs_sum += abs_error;
        self.block_count += 1;
        if self.block_count == self.block_size {
            self.block_maes
                .push(self.block_abs_sum / self.block_size as f64);
            self.block_abs_sum = 0.0;
            self.block_count = 0;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean absolute error over every recorded evaluation
    pub fn mae(&self) -> Option<f64> {
        (self.count > 0).then(|| self.abs_sum / self.count as f64)
    }

    pub fn rmse(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.sq_sum / self.count as f64).sqrt())
    }

    /// MAE of each completed block, oldest first
    pub fn block_maes(&self) -> &[f64] {
        &self.block_maes
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
