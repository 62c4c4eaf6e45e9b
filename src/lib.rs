//! # Streamlearn
//!
//! `streamlearn` bundles the workspace crates behind one dependency:
//!
//! - [`stream_math`]: EMAs, windowed averages, resampling and recursive least squares
//! - [`sensor_stream`]: the streaming pipeline with online learning and evaluation
//! - [`text_mining`]: tf-idf feature spaces and a linear SVC
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use streamlearn::prelude::*;
//!
//! let config = PipelineConfig {
//!     resample_interval_ms: 1_000,
//!     window: 3,
//!     warmup: 5,
//!     ..PipelineConfig::default()
//! };
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let readings = (0..120).map(|s| Reading::new(start + Duration::seconds(s), (s as f64 / 10.0).sin()));
//!
//! let mut pipeline = Pipeline::new(config, CollectingSink::default()).unwrap();
//! let summary = pipeline.run(readings).unwrap();
//! assert_eq!(pipeline.stage(), PipelineStage::TrainingAndEvaluating);
//! assert_eq!(summary.evaluations as usize, pipeline.sink().evaluations.len());
//! ```

pub use sensor_stream;
pub use stream_math;
pub use text_mining;

/// The types most programs need
pub mod prelude {
    pub use sensor_stream::{
        CleanRecord, CollectingSink, ConsoleSink, Evaluation, FeatureConfig, NullSink,
        OnlineLearner, Pipeline, PipelineConfig, PipelineStage, Reading, ReportSink, RunSummary,
    };
    pub use stream_math::{
        AggregationType, Interpolation, RecursiveLinearRegression, RoundStart, TimeEma,
        WindowedAverage,
    };
    pub use text_mining::{
        FeatureSpaceConfig, LinearSvc, SparseMatrix, SparseVector, SvcConfig, SvcModel,
        TextFeatureSpace, Weighting,
    };
}
