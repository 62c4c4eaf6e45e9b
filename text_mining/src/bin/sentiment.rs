//! Sentiment CLI
//!
//! `classify` builds a feature space over a labelled corpus, trains a linear
//! SVC and explains its decisions; `request` prints the call an annotation
//! client would make and `annotate` ranks a saved response.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use text_mining::annotation::DEFAULT_ENDPOINT;
use text_mining::{
    corpus, AnnotationRequest, AnnotationResponse, FeatureSpaceConfig, LinearSvc, StemmerType, Stopwords,
    SvcConfig, TextFeatureSpace, Weighting,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sentiment")]
#[command(about = "tf-idf feature spaces and linear sentiment classification")]
struct Cli {
    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeightArg {
    None,
    Tf,
    Idf,
    Tfidf,
}

impl From<WeightArg> for Weighting {
    fn from(arg: WeightArg) -> Self {
        match arg {
            WeightArg::None => Weighting::None,
            WeightArg::Tf => Weighting::Tf,
            WeightArg::Idf => Weighting::Idf,
            WeightArg::Tfidf => Weighting::Tfidf,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier on a `text,target` CSV corpus and classify examples
    Classify {
        /// Labelled corpus
        #[arg(short, long)]
        input: PathBuf,

        /// JSON feature space configuration; overrides the flags below
        #[arg(long)]
        space: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "tfidf")]
        weight: WeightArg,

        /// Longest n-gram
        #[arg(long, default_value = "2")]
        ngrams: usize,

        /// Remove English stopwords
        #[arg(long)]
        stopwords: bool,

        /// Stem tokens
        #[arg(long)]
        stem: bool,

        /// SVC cost parameter
        #[arg(short, long, default_value = "1.0")]
        c: f64,

        /// SVC training budget in seconds
        #[arg(long, default_value = "5.0")]
        max_time: f64,

        /// Show the most similar corpus documents for each example
        #[arg(long, default_value = "0")]
        neighbours: usize,

        /// Texts to classify
        examples: Vec<String>,
    },

    /// Print the endpoint and query parameters of an annotation request as JSON
    Request {
        /// Service user key
        #[arg(long)]
        user_key: String,

        #[arg(long, default_value = "en")]
        lang: String,

        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Text to annotate
        text: String,
    },

    /// Sort a saved annotation response by page rank and pretty-print it
    Annotate {
        /// JSON response body
        #[arg(short, long)]
        input: PathBuf,
    },
}

const DEFAULT_EXAMPLES: [&str; 4] = [
    "Cats are stupid.",
    "Cats are totally amazing!",
    "Cats are not totally amazing!",
    "Cats are on my computer",
];

const PROBE_WORDS: [&str; 7] = ["good", "cool", "bad", "crap", "find", "nice", "zizek"];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Classify {
            input,
            space,
            weight,
            ngrams,
            stopwords,
            stem,
            c,
            max_time,
            neighbours,
            examples,
        } => {
            let documents = corpus::load_corpus_csv(&input)
                .with_context(|| format!("loading corpus from {}", input.display()))?;
            info!("Loaded {} documents", documents.len());

            let config = match space {
                Some(path) => FeatureSpaceConfig::from_json_file(&path)
                    .with_context(|| format!("loading feature space from {}", path.display()))?,
                None => FeatureSpaceConfig {
                    weight: weight.into(),
                    stopwords: if stopwords { Stopwords::En } else { Stopwords::None },
                    stemmer: if stem { StemmerType::Porter } else { StemmerType::None },
                    ngrams,
                    normalize: true,
                },
            };

            let texts = corpus::texts(&documents);
            let space = TextFeatureSpace::fit(config, &texts)?;
            println!("Built feature space with {} dimensions", space.dim());
            for idx in [1, 10, 100, 1000] {
                if let Some(term) = space.feature(idx) {
                    println!("  \"{}\" => id={}", term, idx);
                }
            }

            let matrix = space.extract_matrix(&texts)?;
            println!(
                "Matrix: cols={}, rows={}, nnz={}",
                matrix.cols(),
                matrix.rows(),
                matrix.nnz()
            );

            let svc = LinearSvc::new(SvcConfig {
                c,
                max_time,
                ..SvcConfig::default()
            })?;
            let model = svc.fit(&matrix, &corpus::targets(&documents))?;

            println!();
            for word in PROBE_WORDS {
                match space.extract(word).indices().next() {
                    Some(idx) => println!(
                        "\"{}\" => id={}, model={:.4}",
                        word,
                        idx,
                        model.weights[idx]
                    ),
                    None => println!("\"{}\" => not in our feature space", word),
                }
            }

            let examples: Vec<String> = if examples.is_empty() {
                DEFAULT_EXAMPLES.iter().map(|s| s.to_string()).collect()
            } else {
                examples
            };

            println!();
            for example in &examples {
                let vector = space.extract(example);
                let label = if model.predict(&vector) > 0.0 { "POS" } else { "NEG" };
                println!("\"{}\" => {} ({:.4})", example, label, model.decision_function(&vector));
                for (idx, value) in vector.iter() {
                    println!(
                        "  \"{}\" => id={}, vec={:.2}, model={:.4}",
                        space.feature(idx).unwrap_or("?"),
                        idx,
                        value,
                        model.weights[idx]
                    );
                }
                for (doc, similarity) in matrix.nearest(&vector, neighbours) {
                    let document = &documents[doc];
                    println!(
                        "   {:.2} => \"{}\" {}",
                        similarity,
                        document.text,
                        if document.is_positive() { "POS" } else { "NEG" }
                    );
                }
            }
        }

        Commands::Request {
            user_key,
            lang,
            endpoint,
            text,
        } => {
            let request = AnnotationRequest::new(user_key, lang, text);
            let query: serde_json::Map<String, serde_json::Value> = request
                .query_pairs()
                .iter()
                .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
                .collect();
            let call = serde_json::json!({ "endpoint": endpoint, "query": query });
            println!("{}", serde_json::to_string_pretty(&call)?);
        }

        Commands::Annotate { input } => {
            let body = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let mut response = AnnotationResponse::parse(&body)?;
            response.sort_by_relevance();
            println!("{}", response.to_pretty_json()?);
        }
    }

    Ok(())
}
