//! Online learner seam
//!
//! The pipeline only needs incremental updates and side-effect free
//! predictions; [`RecursiveLinearRegression`] is the default learner.

use crate::config::PipelineConfig;
use crate::error::Result;
use stream_math::RecursiveLinearRegression;

/// Model updated one observation at a time
pub trait OnlineLearner {
    /// Fold one `(features, target)` pair into the model
    fn update(&mut self, features: &[f64], target: f64) -> Result<()>;

    /// Predict from the current model state without changing it
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Expected feature dimension
    fn dim(&self) -> usize;

    /// Number of updates applied so far
    fn updates(&self) -> u64;
}

impl OnlineLearner for RecursiveLinearRegression {
    fn update(&mut self, features: &[f64], target: f64) -> Result<()> {
        Ok(self.partial_fit(features, target)?)
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok(RecursiveLinearRegression::predict(self, features)?)
    }

    fn dim(&self) -> usize {
        RecursiveLinearRegression::dim(self)
    }

    fn updates(&self) -> u64 {
        RecursiveLinearRegression::updates(self)
    }
}

/// Build the default learner for a configuration
pub fn recursive_learner(config: &PipelineConfig) -> Result<RecursiveLinearRegression> {
    Ok(RecursiveLinearRegression::new(
        config.feature_dim(),
        config.forget_factor,
        config.regularization,
    )?)
}
