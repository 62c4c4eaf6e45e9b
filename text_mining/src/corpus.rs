//! Labelled text corpora

use crate::error::{Result, TextError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One labelled document; the sign of `target` is its class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledText {
    pub text: String,
    pub target: f64,
}

impl LabelledText {
    pub fn new(text: impl Into<String>, target: f64) -> Self {
        Self {
            text: text.into(),
            target,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.target > 0.0
    }
}

/// Load a corpus from a CSV file
///
/// The expected CSV format is:
/// text,target
/// "I love this",1
/// "Not for me",-1
pub fn load_corpus_csv<P: AsRef<Path>>(path: P) -> Result<Vec<LabelledText>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut corpus = Vec::new();

    for row in reader.deserialize::<LabelledText>() {
        let document = row?;
        if !document.target.is_finite() {
            return Err(TextError::DataError(format!(
                "Non-finite target for \"{}\"",
                document.text
            )));
        }
        corpus.push(document);
    }

    if corpus.is_empty() {
        return Err(TextError::EmptyCorpus);
    }
    Ok(corpus)
}

/// Texts of a corpus, in order
pub fn texts(corpus: &[LabelledText]) -> Vec<&str> {
    corpus.iter().map(|d| d.text.as_str()).collect()
}

/// Targets of a corpus, in order
pub fn targets(corpus: &[LabelledText]) -> Vec<f64> {
    corpus.iter().map(|d| d.target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_corpus_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "text,target").unwrap();
        writeln!(file, "\"Cats are amazing, truly\",1").unwrap();
        writeln!(file, "Cats are stupid,-1").unwrap();

        let corpus = load_corpus_csv(file.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].text, "Cats are amazing, truly");
        assert!(corpus[0].is_positive());
        assert_eq!(targets(&corpus), vec![1.0, -1.0]);
        assert_eq!(texts(&corpus)[1], "Cats are stupid");
    }

    #[test]
    fn test_empty_corpus() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "text,target").unwrap();
        assert!(matches!(
            load_corpus_csv(file.path()),
            Err(TextError::EmptyCorpus)
        ));
    }
}
