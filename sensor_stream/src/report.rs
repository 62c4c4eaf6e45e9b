//! Reporting sinks for clean records and evaluations

use crate::data::CleanRecord;
use crate::evaluator::Evaluation;
use chrono::{DateTime, SecondsFormat, Utc};

/// Receives every clean record and every evaluation as they happen
pub trait ReportSink {
    fn on_record(&mut self, record: &CleanRecord);

    fn on_evaluation(&mut self, evaluation: &Evaluation);
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn on_record(&mut self, record: &CleanRecord) {
        (**self).on_record(record)
    }

    fn on_evaluation(&mut self, evaluation: &Evaluation) {
        (**self).on_evaluation(evaluation)
    }
}

/// Format a clean record as `<timestamp> <value> <features...>`
pub fn format_record(record: &CleanRecord) -> String {
    let mut line = format!("{} {:.4}", format_timestamp(record.timestamp), record.value);
    for feature in &record.features {
        line.push_str(&format!(" {:.4}", feature));
    }
    line
}

/// Format an evaluation as `<timestamp> <predicted> <actual> <error>`
pub fn format_evaluation(evaluation: &Evaluation) -> String {
    format!(
        "{} {:.4} {:.4} {:.4}",
        format_timestamp(evaluation.timestamp),
        evaluation.predicted,
        evaluation.actual,
        evaluation.abs_error
    )
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Prints records and evaluations to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    /// Also print every clean record, not only evaluations
    pub show_records: bool,
}

impl ConsoleSink {
    pub fn new(show_records: bool) -> Self {
        Self { show_records }
    }
}

impl ReportSink for ConsoleSink {
    fn on_record(&mut self, record: &CleanRecord) {
        if self.show_records {
            println!("{}", format_record(record));
        }
    }

    fn on_evaluation(&mut self, evaluation: &Evaluation) {
        println!("{}", format_evaluation(evaluation));
    }
}

/// Keeps everything it receives, mostly for tests and analysis
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub records: Vec<CleanRecord>,
    pub evaluations: Vec<Evaluation>,
}

impl ReportSink for CollectingSink {
    fn on_record(&mut self, record: &CleanRecord) {
        self.records.push(record.clone());
    }

    fn on_evaluation(&mut self, evaluation: &Evaluation) {
        self.evaluations.push(evaluation.clone());
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn on_record(&mut self, _record: &CleanRecord) {}

    fn on_evaluation(&mut self, _evaluation: &Evaluation) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_record() {
        let record = CleanRecord {
            id: 3,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 10).unwrap(),
            value: 1.5,
            features: vec![0.25, 2.0 / 3.0],
            prediction: None,
            interpolated: true,
        };

        assert_eq!(
            format_record(&record),
            "2024-01-01T12:00:10Z 1.5000 0.2500 0.6667"
        );

        let record = CleanRecord {
            timestamp: record.timestamp + Duration::milliseconds(250),
            ..record
        };
        assert!(format_record(&record).starts_with("2024-01-01T12:00:10.250Z "));
    }

    #[test]
    fn test_format_evaluation() {
        let evaluation = Evaluation {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 10).unwrap(),
            source_id: 10,
            target_id: 16,
            predicted: 1.0,
            actual: 1.25,
            abs_error: 0.25,
        };

        assert_eq!(
            format_evaluation(&evaluation),
            "2024-01-01T12:01:10Z 1.0000 1.2500 0.2500"
        );
    }

    #[test]
    fn test_mut_reference_is_a_sink() {
        fn report<S: ReportSink>(mut sink: S) {
            sink.on_evaluation(&Evaluation {
                timestamp: Utc::now(),
                source_id: 0,
                target_id: 1,
                predicted: 0.0,
                actual: 0.0,
                abs_error: 0.0,
            });
        }

        let mut sink = CollectingSink::default();
        report(&mut sink);
        report(&mut sink);
        assert_eq!(sink.evaluations.len(), 2);
    }
}
