//! Recursive least squares regression
//!
//! Linear model `y = w . x` updated one observation at a time. The state is
//! the weight vector and the inverse covariance matrix, so memory is
//! O(dim^2) no matter how many observations were folded in.

use crate::{MathError, Result};

/// Growth of the covariance trace over its initial value that triggers a reset
const COVARIANCE_TRACE_LIMIT: f64 = 1e6;

/// Online linear regression with exponential forgetting
#[derive(Debug, Clone)]
pub struct RecursiveLinearRegression {
    dim: usize,
    forget_factor: f64,
    regularization: f64,
    weights: Vec<f64>,
    /// Inverse covariance, row-major `dim x dim`
    covariance: Vec<f64>,
    updates: u64,
    covariance_resets: u64,
}

impl RecursiveLinearRegression {
    /// Create a new regression over `dim` features.
    ///
    /// `forget_factor` must be in (0, 1]; 1.0 weighs all past observations
    /// equally. `regularization` seeds the inverse covariance as `I / regularization`.
    pub fn new(dim: usize, forget_factor: f64, regularization: f64) -> Result<Self> {
        if dim == 0 {
            return Err(MathError::InvalidInput(
                "Dimension must be greater than zero".to_string(),
            ));
        }
        if !(forget_factor > 0.0 && forget_factor <= 1.0) {
            return Err(MathError::InvalidInput(format!(
                "Forget factor must be in (0, 1], got {}",
                forget_factor
            )));
        }
        if !(regularization > 0.0 && regularization.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Regularization must be positive, got {}",
                regularization
            )));
        }

        Ok(Self {
            dim,
            forget_factor,
            regularization,
            weights: vec![0.0; dim],
            covariance: identity(dim, 1.0 / regularization),
            updates: 0,
            covariance_resets: 0,
        })
    }

    fn check_dim(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dim {
            return Err(MathError::DimensionMismatch {
                expected: self.dim,
                got: x.len(),
            });
        }
        Ok(())
    }

    /// Predict the target for `x`. Returns 0.0 before the first update.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        self.check_dim(x)?;
        Ok(dot(&self.weights, x))
    }

    /// Fold one observation into the model
    pub fn partial_fit(&mut self, x: &[f64], y: f64) -> Result<()> {
        self.check_dim(x)?;
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Observation contains non-finite values".to_string(),
            ));
        }

        let n = self.dim;
        let lambda = self.forget_factor;

        // p_x = P x
        let p_x: Vec<f64> = (0..n)
            .map(|i| dot(&self.covariance[i * n..(i + 1) * n], x))
            .collect();
        let denominator = lambda + dot(x, &p_x);
        if !denominator.is_finite() || denominator <= 0.0 {
            return Err(MathError::CalculationError(format!(
                "Degenerate gain denominator {}",
                denominator
            )));
        }

        let gain: Vec<f64> = p_x.iter().map(|v| v / denominator).collect();
        let error = y - dot(&self.weights, x);

        let mut weights = self.weights.clone();
        for (w, k) in weights.iter_mut().zip(&gain) {
            *w += k * error;
        }

        // P = (P - k (P x)^T) / lambda
        let mut covariance = self.covariance.clone();
        for i in 0..n {
            for j in 0..n {
                covariance[i * n + j] = (covariance[i * n + j] - gain[i] * p_x[j]) / lambda;
            }
        }

        // With forgetting, P grows by 1/lambda along directions the inputs
        // never excite; restart it once it has grown past the limit
        let trace: f64 = (0..n).map(|i| covariance[i * n + i]).sum();
        let reset = trace.is_nan() || trace > self.max_trace();
        if reset {
            covariance = identity(n, 1.0 / self.regularization);
        }

        if weights.iter().chain(&covariance).any(|v| !v.is_finite()) {
            return Err(MathError::CalculationError(
                "Update produced non-finite model state".to_string(),
            ));
        }

        self.weights = weights;
        self.covariance = covariance;
        self.updates += 1;
        if reset {
            self.covariance_resets += 1;
        }
        Ok(())
    }

    /// Get the current weight vector
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn forget_factor(&self) -> f64 {
        self.forget_factor
    }

    /// Number of observations folded in so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Sum of the diagonal of the inverse covariance
    pub fn covariance_trace(&self) -> f64 {
        (0..self.dim)
            .map(|i| self.covariance[i * self.dim + i])
            .sum()
    }

    /// Times the inverse covariance was restarted after growing too large
    pub fn covariance_resets(&self) -> u64 {
        self.covariance_resets
    }

    fn max_trace(&self) -> f64 {
        COVARIANCE_TRACE_LIMIT * self.dim as f64 / self.regularization
    }

    /// Reset the model to its initial state
    pub fn reset(&mut self) {
        self.weights = vec![0.0; self.dim];
        self.covariance = identity(self.dim, 1.0 / self.regularization);
        self.updates = 0;
        self.covariance_resets = 0;
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn identity(n: usize, scale: f64) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = scale;
    }
    m
}
