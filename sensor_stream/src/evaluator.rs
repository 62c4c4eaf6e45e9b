//! Lagged training and online evaluation
//!
//! For the record with id `n`:
//! 1. once `n >= window`, the learner is updated with the features of record
//!    `n - window` and the value of record `n`;
//! 2. once `n >= window + warmup`, a prediction is made from the features of
//!    record `n` and stored on it;
//! 3. if record `n - window` carries a prediction, it targeted the value of
//!    record `n` and the absolute error is reported.
//!
//! A learner that rejects an update or cannot predict only loses that step;
//! the record is still stored and reported.

use crate::error::{PipelineError, Result};
use crate::history::RecordHistory;
use crate::learner::OnlineLearner;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of the pipeline, driven only by the record count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PipelineStage {
    /// Not enough records to form a training pair
    ColdStart,
    /// Training, predictions not yet trusted
    TrainingOnly,
    /// Training and predicting
    TrainingAndEvaluating,
}

impl PipelineStage {
    /// Stage of the pipeline when the record with `id` arrives
    pub fn for_record(id: u64, window: usize, warmup: usize) -> Self {
        let window = window as u64;
        if id < window {
            PipelineStage::ColdStart
        } else if id < window + warmup as u64 {
            PipelineStage::TrainingOnly
        } else {
            PipelineStage::TrainingAndEvaluating
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::ColdStart => write!(f, "COLD_START"),
            PipelineStage::TrainingOnly => write!(f, "TRAINING_ONLY"),
            PipelineStage::TrainingAndEvaluating => write!(f, "TRAINING+EVALUATING"),
        }
    }
}

/// A prediction compared to the value it targeted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Timestamp of the record whose value was predicted
    pub timestamp: DateTime<Utc>,
    /// Record the prediction was made from
    pub source_id: u64,
    /// Record whose value was predicted
    pub target_id: u64,
    pub predicted: f64,
    pub actual: f64,
    pub abs_error: f64,
}

/// What happened for one record
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub id: u64,
    pub stage: PipelineStage,
    pub trained: bool,
    pub prediction: Option<f64>,
    pub evaluation: Option<Evaluation>,
}

/// Drives training and evaluation for each new record
#[derive(Debug, Clone)]
pub struct Evaluator {
    window: usize,
    warmup: usize,
    stage: PipelineStage,
    learner_failures: u64,
}

impl Evaluator {
    pub fn new(window: usize, warmup: usize) -> Result<Self> {
        if window == 0 {
            return Err(PipelineError::InvalidParameter(
                "Window must be at least one tick".to_string(),
            ));
        }
        Ok(Self {
            window,
            warmup,
            stage: PipelineStage::ColdStart,
            learner_failures: 0,
        })
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Updates and predictions the learner refused so far
    pub fn learner_failures(&self) -> u64 {
        self.learner_failures
    }

    /// Train, predict and evaluate for the record `id` that was just stored
    pub fn on_record<L>(
        &mut self,
        history: &mut RecordHistory,
        learner: &mut L,
        id: u64,
    ) -> Result<StepOutcome>
    where
        L: OnlineLearner + ?Sized,
    {
        let stage = PipelineStage::for_record(id, self.window, self.warmup);
        if stage < self.stage {
            return Err(PipelineError::DataError(format!(
                "record {} would move the pipeline back from {} to {}",
                id, self.stage, stage
            )));
        }
        if stage != self.stage {
            debug!(id, from = %self.stage, to = %stage, "pipeline stage changed");
            self.stage = stage;
        }

        let (timestamp, actual, features) = {
            let record = history
                .get(id)
                .ok_or_else(|| PipelineError::DataError(format!("record {} not stored", id)))?;
            (record.timestamp, record.value, record.feature_vector())
        };
        let source_id = id.checked_sub(self.window as u64);

        let mut trained = false;
        if let (Some(source_id), true) = (source_id, stage >= PipelineStage::TrainingOnly) {
            let source = history.get(source_id).ok_or_else(|| {
                PipelineError::DataError(format!("training record {} was evicted", source_id))
            })?;
            match learner.update(&source.feature_vector(), actual) {
                Ok(()) => trained = true,
                Err(e) => {
                    warn!(id, source_id, error = %e, "learner rejected update");
                    self.learner_failures += 1;
                }
            }
        }

        let mut prediction = None;
        if stage == PipelineStage::TrainingAndEvaluating {
            match learner.predict(&features) {
                Ok(predicted) => {
                    if let Some(record) = history.get_mut(id) {
                        record.prediction = Some(predicted);
                    }
                    prediction = Some(predicted);
                }
                Err(e) => {
                    warn!(id, error = %e, "learner could not predict");
                    self.learner_failures += 1;
                }
            }
        }

        let evaluation = source_id
            .and_then(|s| history.get(s))
            .and_then(|source| {
                source.prediction.map(|predicted| Evaluation {
                    timestamp,
                    source_id: source.id,
                    target_id: id,
                    predicted,
                    actual,
                    abs_error: (predicted - actual).abs(),
                })
            });

        Ok(StepOutcome {
            id,
            stage,
            trained,
            prediction,
            evaluation,
        })
    }
}
