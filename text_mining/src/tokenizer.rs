//! Word tokenizer with stopword removal, stemming and n-grams

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static PORTER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Common English function words
const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Stopword list applied before stemming
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stopwords {
    #[default]
    None,
    /// Built-in English list
    En,
    /// Caller supplied words, matched case-insensitively
    Custom(Vec<String>),
}

impl Stopwords {
    fn to_set(&self) -> HashSet<String> {
        match self {
            Stopwords::None => HashSet::new(),
            Stopwords::En => ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            Stopwords::Custom(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerType {
    #[default]
    None,
    /// English (Porter family) stemmer
    Porter,
}

/// Splits text into lowercase word tokens
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    stemmer: StemmerType,
}

impl Tokenizer {
    pub fn new(stopwords: &Stopwords, stemmer: StemmerType) -> Self {
        Self {
            stopwords: stopwords.to_set(),
            stemmer,
        }
    }

    /// Lowercase `\w+` tokens, without stopwords, optionally stemmed
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        WORD_REGEX
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|word| !self.stopwords.contains(*word))
            .map(|word| match self.stemmer {
                StemmerType::None => word.to_string(),
                StemmerType::Porter => PORTER.stem(word).into_owned(),
            })
            .collect()
    }
}

/// All n-grams of length `1..=n` over consecutive tokens, joined by a space.
///
/// Grams are ordered by start position, then by length.
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    let mut grams = Vec::with_capacity(tokens.len() * n.max(1));
    for start in 0..tokens.len() {
        for len in 1..=n {
            if start + len > tokens.len() {
                break;
            }
            grams.push(tokens[start..start + len].join(" "));
        }
    }
    grams
}
