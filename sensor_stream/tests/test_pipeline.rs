use chrono::{DateTime, Duration, TimeZone, Utc};
use sensor_stream::data::{self, Reading};
use sensor_stream::{
    bounded_feed, CollectingSink, FeatureConfig, NullSink, OnlineLearner, Pipeline,
    PipelineConfig, PipelineError, PipelineStage, Result,
};
use std::thread;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn ramp(count: i64) -> Vec<Reading> {
    (0..count)
        .map(|s| Reading::new(start() + Duration::seconds(s), s as f64))
        .collect()
}

fn small_config(window: usize, warmup: usize) -> PipelineConfig {
    PipelineConfig {
        resample_interval_ms: 1_000,
        features: vec![FeatureConfig::MovingAverage { window_ms: 2_000 }],
        window,
        warmup,
        ..PipelineConfig::default()
    }
}

/// Learner that remembers every update and predicts a fixed function of its input
#[derive(Debug, Default)]
struct RecordingLearner {
    seen: Vec<(Vec<f64>, f64)>,
}

impl OnlineLearner for RecordingLearner {
    fn update(&mut self, features: &[f64], target: f64) -> Result<()> {
        self.seen.push((features.to_vec(), target));
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok(10.0 * features[0] + features[1])
    }

    fn dim(&self) -> usize {
        2
    }

    fn updates(&self) -> u64 {
        self.seen.len() as u64
    }
}

/// Learner that rejects one chosen update
#[derive(Debug)]
struct FailingOnceLearner {
    fail_at: u64,
    calls: u64,
}

impl OnlineLearner for FailingOnceLearner {
    fn update(&mut self, _features: &[f64], _target: f64) -> Result<()> {
        self.calls += 1;
        if self.calls == self.fail_at {
            return Err(PipelineError::InvalidParameter("update refused".to_string()));
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok(features[0])
    }

    fn dim(&self) -> usize {
        2
    }

    fn updates(&self) -> u64 {
        self.calls
    }
}

#[test]
fn test_training_pairs_are_lagged_by_window() {
    let window = 3;
    let mut pipeline = Pipeline::with_learner(
        small_config(window, 2),
        RecordingLearner::default(),
        CollectingSink::default(),
    )
    .unwrap();
    pipeline.run(ramp(40)).unwrap();

    let updates = pipeline.learner().seen.clone();
    let sink = pipeline.into_sink();
    let records = &sink.records;
    assert!(!updates.is_empty());

    for (k, (features, target)) in updates.iter().enumerate() {
        let id = window + k;
        assert_eq!(features, &records[id - window].feature_vector());
        assert_eq!(*target, records[id].value);
    }
}

#[test]
fn test_prediction_compared_to_value_it_targeted() {
    let window = 3;
    let mut pipeline = Pipeline::with_learner(
        small_config(window, 2),
        RecordingLearner::default(),
        CollectingSink::default(),
    )
    .unwrap();
    pipeline.run(ramp(40)).unwrap();
    let sink = pipeline.into_sink();

    assert!(!sink.evaluations.is_empty());
    for evaluation in &sink.evaluations {
        let source = &sink.records[evaluation.source_id as usize];
        let target = &sink.records[evaluation.target_id as usize];

        assert_eq!(evaluation.target_id - evaluation.source_id, window as u64);
        assert_eq!(Some(evaluation.predicted), source.prediction);
        assert_eq!(
            evaluation.predicted,
            10.0 * source.value + source.features[0]
        );
        assert_eq!(evaluation.actual, target.value);
        assert_eq!(evaluation.timestamp, target.timestamp);
        assert_eq!(
            evaluation.abs_error,
            (evaluation.predicted - evaluation.actual).abs()
        );
    }
}

#[test]
fn test_cold_start_thresholds() {
    let (window, warmup) = (4, 3);
    let mut pipeline = Pipeline::new(small_config(window, warmup), NullSink).unwrap();

    let mut outcomes = Vec::new();
    for reading in ramp(40) {
        outcomes.extend(pipeline.process(&reading).unwrap());
    }

    let mut last_stage = PipelineStage::ColdStart;
    for outcome in &outcomes {
        let id = outcome.id as usize;
        assert!(outcome.stage >= last_stage);
        last_stage = outcome.stage;

        assert_eq!(outcome.trained, id >= window, "record {}", id);
        assert_eq!(
            outcome.prediction.is_some(),
            id >= window + warmup,
            "record {}",
            id
        );
        assert_eq!(
            outcome.evaluation.is_some(),
            id >= 2 * window + warmup,
            "record {}",
            id
        );
    }
    assert_eq!(pipeline.stage(), PipelineStage::TrainingAndEvaluating);
}

#[test]
fn test_predict_is_idempotent() {
    let mut pipeline = Pipeline::new(small_config(2, 1), NullSink).unwrap();
    pipeline.run(ramp(30)).unwrap();

    let learner = pipeline.learner();
    let updates = learner.updates();
    let x = [3.0, 2.5];
    let first = OnlineLearner::predict(learner, &x).unwrap();
    let second = OnlineLearner::predict(learner, &x).unwrap();

    assert_eq!(first, second);
    assert_eq!(learner.updates(), updates);
}

#[test]
fn test_gaps_keep_ids_dense() {
    let mut readings = ramp(10);
    readings.push(Reading::new(start() + Duration::seconds(20), 20.0));
    readings.push(Reading::new(start() + Duration::seconds(21), 21.0));

    let mut pipeline = Pipeline::new(small_config(2, 1), CollectingSink::default()).unwrap();
    pipeline.run(readings).unwrap();
    let sink = pipeline.into_sink();

    for (i, record) in sink.records.iter().enumerate() {
        assert_eq!(record.id, i as u64);
    }
    for pair in sink.records.windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::seconds(1));
    }
    assert!(sink.records.iter().any(|r| r.interpolated));
}

#[test]
fn test_sine_error_decreases() {
    let config = PipelineConfig {
        resample_interval_ms: 1_000,
        features: vec![
            FeatureConfig::Ema {
                interval_ms: 5_000,
                init_window_ms: 1_000,
            },
            FeatureConfig::Ema {
                interval_ms: 20_000,
                init_window_ms: 1_000,
            },
        ],
        window: 6,
        warmup: 10,
        error_block: 100,
        ..PipelineConfig::default()
    };
    let readings = data::sine_wave(start(), Duration::seconds(1), 600);

    let mut pipeline = Pipeline::new(config, NullSink).unwrap();
    let summary = pipeline.run(readings).unwrap();

    assert!(summary.block_maes.len() >= 2);
    assert!(summary.block_maes.iter().all(|mae| mae.is_finite()));
    assert!(summary.block_maes[1] <= summary.block_maes[0] + 1e-9);
    assert!(*summary.block_maes.last().unwrap() < 0.2);
}

#[test]
fn test_default_config_sine_stays_bounded() {
    let readings = data::sine_wave(start(), Duration::seconds(1), 3_000);
    let mut pipeline = Pipeline::new(PipelineConfig::default(), CollectingSink::default()).unwrap();
    let summary = pipeline.run(readings).unwrap();

    assert!(summary.evaluations > 0);
    assert!(summary.mae.unwrap().is_finite());
    assert!(summary.mae.unwrap() < 10.0);
    assert!(pipeline
        .sink()
        .evaluations
        .iter()
        .all(|e| e.abs_error.is_finite()));
}

#[test]
fn test_history_stays_bounded() {
    let mut pipeline = Pipeline::new(small_config(3, 1), NullSink).unwrap();
    pipeline.run(ramp(200)).unwrap();

    assert_eq!(pipeline.history().len(), 4);
    assert!(pipeline.history().total() > 100);
}

#[test]
fn test_bounded_feed_drives_pipeline() {
    let (sender, feed) = bounded_feed(8);
    let producer = thread::spawn(move || {
        for reading in data::sine_wave(start(), Duration::seconds(1), 300) {
            sender.send(reading).unwrap();
        }
    });

    let mut pipeline = Pipeline::new(small_config(6, 10), NullSink).unwrap();
    let summary = pipeline.run(feed).unwrap();
    producer.join().unwrap();

    assert_eq!(summary.readings, 300);
    assert!(summary.evaluations > 0);
}

#[test]
fn test_learner_failure_inside_gap_keeps_every_record() {
    let mut pipeline = Pipeline::with_learner(
        small_config(2, 0),
        FailingOnceLearner {
            fail_at: 3,
            calls: 0,
        },
        CollectingSink::default(),
    )
    .unwrap();

    let seconds = (0..=5).chain(12..=15);
    for s in seconds {
        let reading = Reading::new(start() + Duration::seconds(s), s as f64);
        pipeline.process(&reading).unwrap();
    }

    let summary = pipeline.summary();
    assert_eq!(summary.learner_failures, 1);

    let sink = pipeline.into_sink();
    let records = &sink.records;
    let first = records[0].timestamp;
    assert_eq!(records.last().unwrap().timestamp, start() + Duration::seconds(14));
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.id, i as u64);
        assert_eq!(record.timestamp, first + Duration::seconds(i as i64));
    }
    for evaluation in &sink.evaluations {
        let source = &records[evaluation.source_id as usize];
        let target = &records[evaluation.target_id as usize];
        assert_eq!(target.timestamp - source.timestamp, Duration::seconds(2));
    }
}

#[test]
fn test_forgetting_survives_constant_sensor() {
    let config = PipelineConfig {
        resample_interval_ms: 1_000,
        forget_factor: 0.9,
        ..PipelineConfig::default()
    };
    let readings =
        (0..20_000).map(|s| Reading::new(start() + Duration::seconds(s), 5.0));

    let mut pipeline = Pipeline::new(config, NullSink).unwrap();
    let summary = pipeline.run(readings).unwrap();

    assert_eq!(summary.readings, 20_000);
    assert_eq!(summary.learner_failures, 0);
    assert!(summary.evaluations > 19_000);
    assert!(summary.mae.unwrap() < 1e-3);
    assert!(pipeline.learner().covariance_resets() > 0);
}
