//! Sensor pipeline CLI
//!
//! `predict` runs the full cascade and prints every evaluation;
//! `process` traces the individual streaming aggregates reading by reading.

use anyhow::Context;
use chrono::{Duration, SecondsFormat, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sensor_stream::data::{self, Reading};
use sensor_stream::{ConsoleSink, Pipeline, PipelineConfig};
use std::path::PathBuf;
use stream_math::{AggregationType, Interpolation, Resampler, RoundStart, TimeEma, WindowedAverage};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sensor_pipeline")]
#[command(about = "Streaming resampling, online learning and online evaluation of sensor readings")]
struct Cli {
    /// Log debug events from the pipeline
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Synthetic {
    /// sin(t) sampled at a fixed rate
    Sine,
    /// Brownian motion with irregular spacing
    Brownian,
}

#[derive(clap::Args)]
struct Source {
    /// CSV file with `timestamp,value` rows; synthetic data when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Synthetic generator used without an input file
    #[arg(long, value_enum, default_value = "sine")]
    synthetic: Synthetic,

    /// Number of synthetic readings
    #[arg(short = 'n', long, default_value = "3600")]
    count: usize,

    /// Spacing of synthetic readings in milliseconds
    #[arg(long, default_value = "1000")]
    step_ms: i64,

    /// Seed of the Brownian generator
    #[arg(long, default_value = "42")]
    seed: u64,
}

impl Source {
    fn readings(&self) -> anyhow::Result<Vec<Reading>> {
        if let Some(path) = &self.input {
            return data::load_readings_csv(path)
                .with_context(|| format!("loading readings from {}", path.display()));
        }

        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .context("invalid start timestamp")?;
        Ok(match self.synthetic {
            Synthetic::Sine => {
                data::sine_wave(start, Duration::milliseconds(self.step_ms), self.count)
            }
            Synthetic::Brownian => {
                data::brownian_motion(start, self.count, self.step_ms as f64, 1.0, self.seed)?
            }
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train and evaluate the online learner on a stream of readings
    Predict {
        #[command(flatten)]
        source: Source,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the prediction lag in ticks
        #[arg(long)]
        window: Option<usize>,

        /// Override the warmup in ticks
        #[arg(long)]
        warmup: Option<usize>,

        /// Override the resample interval in milliseconds
        #[arg(long)]
        resample_ms: Option<i64>,

        /// Print every clean record as well
        #[arg(long)]
        records: bool,
    },

    /// Print raw readings next to the moving average, EMA and resampler output
    Process {
        #[command(flatten)]
        source: Source,

        /// Moving average window and EMA interval in milliseconds
        #[arg(long, default_value = "10000")]
        span_ms: i64,

        /// Resample interval in milliseconds
        #[arg(long, default_value = "1000")]
        resample_ms: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Predict {
            source,
            config,
            window,
            warmup,
            resample_ms,
            records,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)
                    .with_context(|| format!("loading configuration from {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(window) = window {
                config.window = window;
            }
            if let Some(warmup) = warmup {
                config.warmup = warmup;
            }
            if let Some(resample_ms) = resample_ms {
                config.resample_interval_ms = resample_ms;
            }

            let readings = source.readings()?;
            info!("Running pipeline over {} readings", readings.len());

            let mut pipeline = Pipeline::new(config, ConsoleSink::new(records))?;
            let summary = pipeline.run(readings)?;
            println!();
            print!("{}", summary);
        }

        Commands::Process {
            source,
            span_ms,
            resample_ms,
        } => {
            let readings = source.readings()?;
            let mut average = WindowedAverage::new(span_ms)?;
            let mut ema = TimeEma::new(span_ms, span_ms, Interpolation::Previous)?;
            let mut resampler = Resampler::new(
                resample_ms,
                AggregationType::Avg,
                RoundStart::Second,
                Interpolation::Previous,
            )?;

            for (id, reading) in readings.iter().enumerate() {
                let t = reading.millis();
                let at = reading
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true);
                println!("{} raw {} {:.2}", id, at, reading.value);

                average.update(t, reading.value)?;
                if let Ok(value) = average.value() {
                    println!("MAvg {} {:.2}", at, value);
                }

                ema.update(t, reading.value)?;
                if let Ok(value) = ema.value() {
                    println!("EMA {} {:.2}", at, value);
                }

                for bucket in resampler.update(t, reading.value)? {
                    let start = data::datetime_from_millis(bucket.start)?;
                    println!(
                        "Resampler {} {:.2}{}",
                        start.to_rfc3339_opts(SecondsFormat::Millis, true),
                        bucket.value,
                        if bucket.filled { " (interpolated)" } else { "" }
                    );
                }
            }
        }
    }

    Ok(())
}
