//! Text feature space
//!
//! Maps text to sparse vectors over a vocabulary of n-grams fixed when the
//! space is built from a corpus:
//! - `none`: raw counts
//! - `tf`: `1 + ln(count)`
//! - `idf`: `idf` for every present term
//! - `tfidf`: `count * idf`
//!
//! with the smoothed `idf = ln((1 + N) / (1 + df)) + 1`.

use crate::error::{Result, TextError};
use crate::sparse::{SparseMatrix, SparseVector};
use crate::tokenizer::{ngrams, StemmerType, Stopwords, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Term weighting scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    None,
    Tf,
    Idf,
    #[default]
    Tfidf,
}

impl Weighting {
    fn apply(self, count: f64, idf: f64) -> f64 {
        match self {
            Weighting::None => count,
            Weighting::Tf => 1.0 + count.ln(),
            Weighting::Idf => idf,
            Weighting::Tfidf => count * idf,
        }
    }
}

/// Settings of a text feature space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSpaceConfig {
    pub weight: Weighting,
    pub stopwords: Stopwords,
    pub stemmer: StemmerType,
    /// Longest n-gram; 1 means single words
    pub ngrams: usize,
    /// Scale extracted vectors to unit length
    pub normalize: bool,
}

impl Default for FeatureSpaceConfig {
    fn default() -> Self {
        Self {
            weight: Weighting::Tfidf,
            stopwords: Stopwords::None,
            stemmer: StemmerType::None,
            ngrams: 1,
            normalize: true,
        }
    }
}

impl FeatureSpaceConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: FeatureSpaceConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ngrams == 0 {
            return Err(TextError::InvalidParameter(
                "N-gram length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Vocabulary and document frequencies built once from a corpus
#[derive(Debug, Clone)]
pub struct TextFeatureSpace {
    config: FeatureSpaceConfig,
    tokenizer: Tokenizer,
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    doc_freq: Vec<usize>,
    idf: Vec<f64>,
    documents: usize,
}

impl TextFeatureSpace {
    /// Build the space from a corpus. Term indices follow first occurrence.
    pub fn fit<S: AsRef<str>>(config: FeatureSpaceConfig, documents: &[S]) -> Result<Self> {
        config.validate()?;
        if documents.is_empty() {
            return Err(TextError::EmptyCorpus);
        }

        let tokenizer = Tokenizer::new(&config.stopwords, config.stemmer);
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for document in documents {
            let mut seen = HashSet::new();
            for gram in ngrams(&tokenizer.tokenize(document.as_ref()), config.ngrams) {
                let idx = match vocabulary.get(&gram) {
                    Some(&idx) => idx,
                    None => {
                        let idx = terms.len();
                        vocabulary.insert(gram.clone(), idx);
                        terms.push(gram);
                        doc_freq.push(0);
                        idx
                    }
                };
                if seen.insert(idx) {
                    doc_freq[idx] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        debug!(
            documents = documents.len(),
            dim = terms.len(),
            "feature space built"
        );

        Ok(Self {
            config,
            tokenizer,
            vocabulary,
            terms,
            doc_freq,
            idf,
            documents: documents.len(),
        })
    }

    /// Sparse vector of `text`; unknown terms are ignored
    pub fn extract(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in ngrams(&self.tokenizer.tokenize(text), self.config.ngrams) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(idx, count)| (idx, self.config.weight.apply(count, self.idf[idx])))
            .collect();
        let mut vector = SparseVector::from_pairs(pairs);
        if self.config.normalize {
            vector.normalize();
        }
        vector
    }

    /// One column per text
    pub fn extract_matrix<S: AsRef<str>>(&self, texts: &[S]) -> Result<SparseMatrix> {
        let columns = texts.iter().map(|t| self.extract(t.as_ref())).collect();
        SparseMatrix::from_columns(self.dim(), columns)
    }

    /// Number of features
    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    /// Term of a feature index
    pub fn feature(&self, idx: usize) -> Option<&str> {
        self.terms.get(idx).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, idx: usize) -> Option<f64> {
        self.idf.get(idx).copied()
    }

    /// Documents containing the term at `idx`
    pub fn doc_freq(&self, idx: usize) -> Option<usize> {
        self.doc_freq.get(idx).copied()
    }

    /// Size of the corpus the space was built from
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn config(&self) -> &FeatureSpaceConfig {
        &self.config
    }
}
