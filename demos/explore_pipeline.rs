// Walks through the workspace: the sensor pipeline on synthetic feeds, then
// a small sentiment model.
use chrono::{Duration, TimeZone, Utc};
use sensor_stream::data;
use sensor_stream::report::format_evaluation;
use streamlearn::prelude::*;
use text_mining::corpus;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    println!("=== Sensor pipeline: sin(t) at 1 Hz ===");
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
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::new(config, CollectingSink::default())?;
    let summary = pipeline.run(data::sine_wave(start, Duration::seconds(1), 1_000))?;
    for evaluation in pipeline.sink().evaluations.iter().take(5) {
        println!("{}", format_evaluation(evaluation));
    }
    println!("...");
    print!("{}", summary);

    println!("\n=== Sensor pipeline: irregular Brownian motion ===");
    let readings = data::brownian_motion(start, 20_000, 700.0, 0.5, 7)?;
    let mut pipeline = Pipeline::new(PipelineConfig::default(), NullSink)?;
    print!("{}", pipeline.run(readings)?);

    println!("\n=== Sentiment ===");
    let documents = corpus::load_corpus_csv("demos/data/tweets.csv")?;
    let texts = corpus::texts(&documents);
    let space = TextFeatureSpace::fit(
        FeatureSpaceConfig {
            ngrams: 2,
            ..FeatureSpaceConfig::default()
        },
        &texts,
    )?;
    let model = LinearSvc::default().fit(&space.extract_matrix(&texts)?, &corpus::targets(&documents))?;
    println!("Feature space with {} dimensions", space.dim());

    for example in ["Cats are totally amazing!", "Cats are stupid.", "my computer is awful"] {
        let vector = space.extract(example);
        let label = if model.predict(&vector) > 0.0 { "POS" } else { "NEG" };
        println!("\"{}\" => {} {}", example, label, vector);
    }

    Ok(())
}
