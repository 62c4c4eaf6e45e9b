//! # Text Mining
//!
//! Text feature spaces and linear classification for short documents.
//!
//! ## Features
//!
//! - Word tokenization with stopwords, stemming and n-grams
//! - tf-idf feature spaces with a vocabulary fixed at build time
//! - Sparse vectors and matrices, cosine nearest neighbours
//! - Linear support vector classifier with introspectable weights
//! - Request/response model of a wikifier-style annotation service
//!
//! ## Quick Start
//!
//! ```rust
//! use text_mining::{FeatureSpaceConfig, LinearSvc, TextFeatureSpace};
//!
//! let corpus = ["good fun", "good times", "bad day", "bad news"];
//! let targets = [1.0, 1.0, -1.0, -1.0];
//!
//! let space = TextFeatureSpace::fit(FeatureSpaceConfig::default(), &corpus)?;
//! let model = LinearSvc::default().fit(&space.extract_matrix(&corpus)?, &targets)?;
//!
//! let good = space.index_of("good").unwrap();
//! assert!(model.weight(good).unwrap() > 0.0);
//! assert_eq!(model.predict(&space.extract("so good")), 1.0);
//! assert_eq!(model.predict(&space.extract("so bad")), -1.0);
//! # Ok::<(), text_mining::TextError>(())
//! ```

pub mod annotation;
pub mod corpus;
pub mod error;
pub mod feature_space;
pub mod sparse;
pub mod svc;
pub mod tokenizer;

pub use annotation::{Annotation, AnnotationRequest, AnnotationResponse};
pub use corpus::{load_corpus_csv, LabelledText};
pub use error::{Result, TextError};
pub use feature_space::{FeatureSpaceConfig, TextFeatureSpace, Weighting};
pub use sparse::{SparseMatrix, SparseVector};
pub use svc::{LinearSvc, SvcConfig, SvcModel};
pub use tokenizer::{ngrams, StemmerType, Stopwords, Tokenizer};
