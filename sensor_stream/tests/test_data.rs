use sensor_stream::data::load_readings_csv;
use sensor_stream::{CollectingSink, Pipeline, PipelineConfig, PipelineError};
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,value").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_load_readings_csv() {
    let file = csv_file(&[
        "2024-01-01T00:00:00Z,1.5".to_string(),
        "2024-01-01T00:00:00.700Z,-2.25".to_string(),
        "2024-01-01T00:00:01.400+00:00,3".to_string(),
    ]);

    let readings = load_readings_csv(file.path()).unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[1].value, -2.25);
    assert_eq!(readings[2].millis() - readings[0].millis(), 1_400);
}

#[test]
fn test_load_rejects_bad_files() {
    let empty = csv_file(&[]);
    assert!(matches!(
        load_readings_csv(empty.path()),
        Err(PipelineError::DataError(_))
    ));

    let malformed = csv_file(&["yesterday,1.0".to_string()]);
    assert!(matches!(
        load_readings_csv(malformed.path()),
        Err(PipelineError::CsvError(_))
    ));

    let non_finite = csv_file(&["2024-01-01T00:00:00Z,NaN".to_string()]);
    assert!(load_readings_csv(non_finite.path()).is_err());

    assert!(load_readings_csv("/nonexistent/readings.csv").is_err());
}

#[test]
fn test_csv_readings_through_pipeline() {
    let rows: Vec<String> = (0..600)
        .map(|s| {
            format!(
                "2024-01-01T{:02}:{:02}:{:02}Z,{}",
                s / 3600,
                (s / 60) % 60,
                s % 60,
                (s as f64 / 30.0).sin()
            )
        })
        .collect();
    let file = csv_file(&rows);
    let readings = load_readings_csv(file.path()).unwrap();

    let config = PipelineConfig::from_json_str(
        r#"{
            "resample_interval_ms": 5000,
            "features": [
                { "type": "ema", "interval_ms": 30000, "init_window_ms": 5000 },
                { "type": "moving_average", "window_ms": 20000 }
            ],
            "window": 2,
            "warmup": 4
        }"#,
    )
    .unwrap();

    let mut pipeline = Pipeline::new(config, CollectingSink::default()).unwrap();
    let summary = pipeline.run(readings).unwrap();

    assert_eq!(summary.readings, 600);
    assert!(summary.evaluations > 50);
    assert!(pipeline
        .sink()
        .records
        .iter()
        .all(|r| r.features.len() == 2));
}

#[test]
fn test_demo_configuration_loads() {
    let config = PipelineConfig::from_json_file("../demos/data/pipeline.json").unwrap();
    assert_eq!(config.feature_dim(), 4);
    assert_eq!(
        config.feature_names(),
        vec!["value", "ema_60s", "ema_600s", "ma_30s"]
    );
}
