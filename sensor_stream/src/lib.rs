//! # Sensor Stream
//!
//! A streaming feature/label pipeline with online model updates and online
//! evaluation.
//!
//! ## Features
//!
//! - Fixed-cadence resampling of irregular readings with gap interpolation
//! - Derived features: time-weighted EMAs and windowed averages
//! - Lagged training of an online learner (recursive least squares by default)
//! - Online evaluation of every prediction against the value it targeted
//! - Reporting sinks, error tracking and run summaries
//! - Ingestion from CSV, synthetic generators or a bounded channel feed
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use sensor_stream::{data, CollectingSink, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig {
//!     resample_interval_ms: 1_000,
//!     ..PipelineConfig::default()
//! };
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let readings = data::sine_wave(start, Duration::seconds(1), 2_000);
//!
//! let mut pipeline = Pipeline::new(config, CollectingSink::default())?;
//! let summary = pipeline.run(readings)?;
//!
//! assert!(summary.evaluations > 0);
//! assert!(summary.mae.unwrap().is_finite());
//! # Ok::<(), sensor_stream::PipelineError>(())
//! ```

pub mod aggregator;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod feed;
pub mod history;
pub mod learner;
pub mod metrics;
pub mod pipeline;
pub mod report;

pub use aggregator::{FeatureAggregator, Tick};
pub use config::{FeatureConfig, OutOfOrderPolicy, PipelineConfig};
pub use data::{CleanRecord, Reading};
pub use error::{PipelineError, Result};
pub use evaluator::{Evaluation, Evaluator, PipelineStage, StepOutcome};
pub use feed::{bounded_feed, FeedSender, ReadingFeed};
pub use history::RecordHistory;
pub use learner::OnlineLearner;
pub use metrics::ErrorTracker;
pub use pipeline::{Pipeline, RunSummary};
pub use report::{CollectingSink, ConsoleSink, NullSink, ReportSink};
