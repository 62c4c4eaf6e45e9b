//! Linear support vector classifier
//!
//! Trained once on a sparse matrix (one column per example) with dual
//! coordinate descent on the hinge loss. The bias is learned as the weight
//! of an implicit constant feature.

use crate::error::{Result, TextError};
use crate::sparse::{SparseMatrix, SparseVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcConfig {
    /// Cost of margin violations
    pub c: f64,
    /// Passes over the training set
    pub max_iterations: usize,
    /// Wall-clock training budget in seconds
    pub max_time: f64,
    /// Stop once the projected gradient spread falls below this
    pub eps: f64,
    /// Seed for the coordinate order
    pub seed: u64,
}

impl Default for SvcConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iterations: 10_000,
            max_time: 5.0,
            eps: 1e-3,
            seed: 0,
        }
    }
}

impl SvcConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(TextError::InvalidParameter(format!(
                "Cost must be positive, got {}",
                self.c
            )));
        }
        if !(self.max_time > 0.0 && self.max_time.is_finite()) || self.max_iterations == 0 {
            return Err(TextError::InvalidParameter(
                "Training needs a positive time budget and at least one iteration".to_string(),
            ));
        }
        if !(self.eps > 0.0) {
            return Err(TextError::InvalidParameter(format!(
                "Tolerance must be positive, got {}",
                self.eps
            )));
        }
        Ok(())
    }
}

/// Trainer for [`SvcModel`]
#[derive(Debug, Clone, Default)]
pub struct LinearSvc {
    config: SvcConfig,
}

impl LinearSvc {
    pub fn new(config: SvcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SvcConfig {
        &self.config
    }

    /// Train on the columns of `examples`; a target's sign is its class
    pub fn fit(&self, examples: &SparseMatrix, targets: &[f64]) -> Result<SvcModel> {
        if examples.cols() == 0 {
            return Err(TextError::EmptyCorpus);
        }
        if examples.cols() != targets.len() {
            return Err(TextError::DimensionMismatch {
                expected: examples.cols(),
                got: targets.len(),
            });
        }
        if let Some(bad) = targets.iter().find(|t| !t.is_finite()) {
            return Err(TextError::InvalidParameter(format!(
                "Non-finite target {}",
                bad
            )));
        }

        let labels: Vec<f64> = targets
            .iter()
            .map(|&t| if t > 0.0 { 1.0 } else { -1.0 })
            .collect();
        // Squared norms of the examples extended with the constant feature
        let q_diag: Vec<f64> = examples
            .columns()
            .iter()
            .map(|x| x.iter().map(|(_, v)| v * v).sum::<f64>() + 1.0)
            .collect();

        let c = self.config.c;
        let mut alpha = vec![0.0; labels.len()];
        let mut weights = vec![0.0; examples.rows()];
        let mut bias = 0.0;

        let mut order: Vec<usize> = (0..labels.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let budget = Duration::from_secs_f64(self.config.max_time);
        let started = Instant::now();

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.max_iterations {
            if started.elapsed() > budget {
                warn!(iterations, "SVC training stopped at the time budget");
                break;
            }
            iterations += 1;
            order.shuffle(&mut rng);

            let mut max_pg = f64::NEG_INFINITY;
            let mut min_pg = f64::INFINITY;
            for &i in &order {
                let x = &examples.columns()[i];
                let y = labels[i];
                let gradient = y * (x.dot_dense(&weights) + bias) - 1.0;

                let projected = if alpha[i] == 0.0 {
                    gradient.min(0.0)
                } else if alpha[i] == c {
                    gradient.max(0.0)
                } else {
                    gradient
                };
                max_pg = max_pg.max(projected);
                min_pg = min_pg.min(projected);

                if projected.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (old - gradient / q_diag[i]).clamp(0.0, c);
                    let step = (alpha[i] - old) * y;
                    for (idx, value) in x.iter() {
                        weights[idx] += step * value;
                    }
                    bias += step;
                }
            }

            if max_pg - min_pg < self.config.eps {
                converged = true;
                break;
            }
        }

        let support_vectors = alpha.iter().filter(|&&a| a > 0.0).count();
        debug!(
            iterations,
            converged,
            support_vectors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SVC trained"
        );

        Ok(SvcModel {
            weights,
            bias,
            iterations,
            converged,
            support_vectors,
        })
    }
}

/// Linear decision model `sign(w·x + b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Passes made during training
    pub iterations: usize,
    /// False when training stopped at the iteration or time budget
    pub converged: bool,
    pub support_vectors: usize,
}

impl SvcModel {
    /// Signed margin of `x`
    pub fn decision_function(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.bias
    }

    /// `1.0` for the positive class, `-1.0` otherwise
    pub fn predict(&self, x: &SparseVector) -> f64 {
        if self.decision_function(x) > 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Weight of a single feature
    pub fn weight(&self, idx: usize) -> Option<f64> {
        self.weights.get(idx).copied()
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (SparseMatrix, Vec<f64>) {
        // Feature 0 marks positives, feature 1 negatives, feature 2 is shared noise
        let columns = vec![
            SparseVector::from_pairs(vec![(0, 1.0), (2, 0.5)]),
            SparseVector::from_pairs(vec![(0, 0.8)]),
            SparseVector::from_pairs(vec![(0, 1.2), (2, 0.3)]),
            SparseVector::from_pairs(vec![(1, 1.0), (2, 0.5)]),
            SparseVector::from_pairs(vec![(1, 0.9)]),
            SparseVector::from_pairs(vec![(1, 1.1), (2, 0.2)]),
        ];
        let matrix = SparseMatrix::from_columns(3, columns).unwrap();
        (matrix, vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0])
    }

    #[test]
    fn test_separable_data() {
        let (matrix, targets) = separable();
        let model = LinearSvc::default().fit(&matrix, &targets).unwrap();

        assert_eq!(model.dim(), 3);
        assert!(model.weight(0).unwrap() > 0.0);
        assert!(model.weight(1).unwrap() < 0.0);
        for (column, target) in matrix.columns().iter().zip(&targets) {
            assert_eq!(model.predict(column), *target);
        }
        assert!(model.converged);
    }

    #[test]
    fn test_training_is_reproducible() {
        let (matrix, targets) = separable();
        let svc = LinearSvc::new(SvcConfig {
            seed: 11,
            ..SvcConfig::default()
        })
        .unwrap();

        assert_eq!(
            svc.fit(&matrix, &targets).unwrap(),
            svc.fit(&matrix, &targets).unwrap()
        );
    }

    #[test]
    fn test_targets_reduced_to_sign() {
        let (matrix, _) = separable();
        let scaled = vec![3.0, 0.5, 2.0, -4.0, -0.1, 0.0];
        let model = LinearSvc::default().fit(&matrix, &scaled).unwrap();
        assert_eq!(model.predict(matrix.column(0).unwrap()), 1.0);
        assert_eq!(model.predict(matrix.column(3).unwrap()), -1.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let (matrix, targets) = separable();
        let svc = LinearSvc::default();

        assert!(svc.fit(&matrix, &targets[..3]).is_err());
        assert!(svc.fit(&SparseMatrix::new(3), &[]).is_err());
        assert!(svc
            .fit(&matrix, &[1.0, f64::NAN, 1.0, -1.0, -1.0, -1.0])
            .is_err());
        assert!(LinearSvc::new(SvcConfig {
            c: 0.0,
            ..SvcConfig::default()
        })
        .is_err());
    }
}
