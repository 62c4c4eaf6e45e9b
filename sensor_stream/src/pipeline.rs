//! The synchronous cascade: aggregate, emit, train, evaluate, report

use crate::aggregator::FeatureAggregator;
use crate::config::{OutOfOrderPolicy, PipelineConfig};
use crate::data::Reading;
use crate::error::{PipelineError, Result};
use crate::evaluator::{Evaluator, PipelineStage, StepOutcome};
use crate::history::RecordHistory;
use crate::learner::{recursive_learner, OnlineLearner};
use crate::metrics::ErrorTracker;
use crate::report::{NullSink, ReportSink};
use std::fmt;
use stream_math::RecursiveLinearRegression;
use tracing::{debug, info, warn};

/// Streaming pipeline owning every piece of state.
///
/// Each call to [`Pipeline::process`] runs the whole cascade for one
/// reading before returning.
#[derive(Debug)]
pub struct Pipeline<L = RecursiveLinearRegression, S = NullSink> {
    config: PipelineConfig,
    aggregator: FeatureAggregator,
    history: RecordHistory,
    evaluator: Evaluator,
    learner: L,
    sink: S,
    errors: ErrorTracker,
    readings: u64,
    skipped: u64,
}

impl<S: ReportSink> Pipeline<RecursiveLinearRegression, S> {
    /// Pipeline with the recursive least squares learner described by `config`
    pub fn new(config: PipelineConfig, sink: S) -> Result<Self> {
        let learner = recursive_learner(&config)?;
        Self::with_learner(config, learner, sink)
    }
}

impl<L: OnlineLearner, S: ReportSink> Pipeline<L, S> {
    /// Pipeline with a custom learner. Its dimension must be `1 + features`.
    pub fn with_learner(config: PipelineConfig, learner: L, sink: S) -> Result<Self> {
        config.validate()?;
        if learner.dim() != config.feature_dim() {
            return Err(PipelineError::InvalidParameter(format!(
                "Learner expects {} inputs but the configuration produces {}",
                learner.dim(),
                config.feature_dim()
            )));
        }

        let aggregator = FeatureAggregator::new(&config)?;
        let history = RecordHistory::new(config.effective_history());
        let evaluator = Evaluator::new(config.window, config.warmup)?;
        let errors = ErrorTracker::new(config.error_block)?;
        debug!(
            features = ?config.feature_names(),
            window = config.window,
            warmup = config.warmup,
            "pipeline created"
        );

        Ok(Self {
            config,
            aggregator,
            history,
            evaluator,
            learner,
            sink,
            errors,
            readings: 0,
            skipped: 0,
        })
    }

    /// Run the cascade for one reading.
    ///
    /// Returns one outcome per clean record the reading completed. A reading
    /// inside the current bucket completes none. Every completed record is
    /// stored and reported even when one of them fails; the first failure
    /// is returned once all of them went through.
    pub fn process(&mut self, reading: &Reading) -> Result<Vec<StepOutcome>> {
        let skip = self.config.out_of_order == OutOfOrderPolicy::Skip;
        let ticks = match self.aggregator.push(reading) {
            Ok(ticks) => ticks,
            Err(PipelineError::OutOfOrder { last, got }) if skip => {
                warn!(%last, %got, "skipping out-of-order reading");
                self.skipped += 1;
                return Ok(Vec::new());
            }
            Err(PipelineError::GapTooLarge { at, ticks, limit }) if skip => {
                warn!(%at, ticks, limit, "skipping reading past the gap limit");
                self.skipped += 1;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        self.readings += 1;

        let mut outcomes = Vec::with_capacity(ticks.len());
        let mut failure = None;
        for tick in ticks {
            let id = self.history.push(tick);
            let outcome = self
                .evaluator
                .on_record(&mut self.history, &mut self.learner, id);

            if let Some(record) = self.history.get(id) {
                self.sink.on_record(record);
            }
            match outcome {
                Ok(outcome) => {
                    if let Some(evaluation) = &outcome.evaluation {
                        self.errors.record(evaluation.abs_error);
                        self.sink.on_evaluation(evaluation);
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(id, error = %e, "record was stored without training or evaluation");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }

    /// Feed every reading through the pipeline, stopping at the first error
    pub fn run<I>(&mut self, readings: I) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Reading>,
    {
        for reading in readings {
            self.process(&reading)?;
        }
        let summary = self.summary();
        info!(
            records = summary.records,
            evaluations = summary.evaluations,
            "pipeline run finished"
        );
        Ok(summary)
    }

    /// Snapshot of the counters and error statistics
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            readings: self.readings,
            skipped: self.skipped,
            suppressed: self.aggregator.suppressed(),
            records: self.history.total(),
            updates: self.learner.updates(),
            learner_failures: self.evaluator.learner_failures(),
            evaluations: self.errors.count(),
            stage: self.evaluator.stage(),
            mae: self.errors.mae(),
            rmse: self.errors.rmse(),
            block_maes: self.errors.block_maes().to_vec(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.evaluator.stage()
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn history(&self) -> &RecordHistory {
        &self.history
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn errors(&self) -> &ErrorTracker {
        &self.errors
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Counters and error statistics of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Readings accepted
    pub readings: u64,
    /// Out-of-order or far-future readings dropped
    pub skipped: u64,
    /// Ticks dropped while features warmed up
    pub suppressed: u64,
    /// Clean records emitted
    pub records: u64,
    pub updates: u64,
    /// Updates and predictions the learner refused
    pub learner_failures: u64,
    pub evaluations: u64,
    pub stage: PipelineStage,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub block_maes: Vec<f64>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Readings:    {} ({} skipped)", self.readings, self.skipped)?;
        writeln!(f, "Records:     {} ({} suppressed)", self.records, self.suppressed)?;
        writeln!(
            f,
            "Updates:     {} ({} learner failures)",
            self.updates, self.learner_failures
        )?;
        writeln!(f, "Evaluations: {}", self.evaluations)?;
        writeln!(f, "Stage:       {}", self.stage)?;
        match (self.mae, self.rmse) {
            (Some(mae), Some(rmse)) => writeln!(f, "MAE: {:.4}  RMSE: {:.4}", mae, rmse)?,
            _ => writeln!(f, "MAE: n/a  RMSE: n/a")?,
        }
        for (i, mae) in self.block_maes.iter().enumerate() {
            writeln!(f, "  block {:>3}: {:.4}", i + 1, mae)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::report::CollectingSink;
    use chrono::{Duration, TimeZone, Utc};

    fn config() -> PipelineConfig {
        PipelineConfig {
            resample_interval_ms: 1_000,
            features: vec![FeatureConfig::MovingAverage { window_ms: 2_000 }],
            window: 2,
            warmup: 1,
            ..PipelineConfig::default()
        }
    }

    fn at(secs: i64, value: f64) -> Reading {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Reading::new(start + Duration::seconds(secs), value)
    }

    #[test]
    fn test_learner_dimension_checked() {
        let learner = RecursiveLinearRegression::new(5, 1.0, 1.0).unwrap();
        assert!(Pipeline::with_learner(config(), learner, NullSink).is_err());
    }

    #[test]
    fn test_reading_inside_bucket_completes_nothing() {
        let mut pipeline = Pipeline::new(config(), NullSink).unwrap();
        for s in 0..=3 {
            pipeline.process(&at(s, 1.0)).unwrap();
        }
        assert!(pipeline.process(&at(3, 1.0)).unwrap().is_empty());
    }

    #[test]
    fn test_skip_policy_drops_out_of_order() {
        let config = PipelineConfig {
            out_of_order: OutOfOrderPolicy::Skip,
            ..config()
        };
        let mut pipeline = Pipeline::new(config, CollectingSink::default()).unwrap();
        pipeline.process(&at(5, 1.0)).unwrap();

        assert!(pipeline.process(&at(4, 1.0)).unwrap().is_empty());
        assert_eq!(pipeline.summary().skipped, 1);
        assert_eq!(pipeline.summary().readings, 1);
    }

    #[test]
    fn test_reject_policy_errors_on_out_of_order() {
        let mut pipeline = Pipeline::new(config(), NullSink).unwrap();
        pipeline.process(&at(5, 1.0)).unwrap();
        assert!(matches!(
            pipeline.process(&at(4, 1.0)),
            Err(PipelineError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_gap_limit_follows_policy() {
        let limited = PipelineConfig {
            max_gap_ticks: 60,
            ..config()
        };
        let mut pipeline = Pipeline::new(limited.clone(), NullSink).unwrap();
        pipeline.process(&at(0, 1.0)).unwrap();
        assert!(matches!(
            pipeline.process(&at(3_600, 1.0)),
            Err(PipelineError::GapTooLarge { limit: 60, .. })
        ));

        let skipping = PipelineConfig {
            out_of_order: OutOfOrderPolicy::Skip,
            ..limited
        };
        let mut pipeline = Pipeline::new(skipping, CollectingSink::default()).unwrap();
        for s in 0..10 {
            pipeline.process(&at(s, 1.0)).unwrap();
        }
        assert!(pipeline.process(&at(3_600, 1.0)).unwrap().is_empty());
        pipeline.process(&at(10, 1.0)).unwrap();

        let summary = pipeline.summary();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.readings, 11);
    }

    #[test]
    fn test_summary_display() {
        let mut pipeline = Pipeline::new(config(), NullSink).unwrap();
        let summary = pipeline.run((0..30).map(|s| at(s, s as f64))).unwrap();

        assert_eq!(summary.readings, 30);
        assert!(summary.evaluations > 0);
        let text = summary.to_string();
        assert!(text.contains("Stage:       TRAINING+EVALUATING"));
        assert!(text.contains("MAE: "));
    }
}
