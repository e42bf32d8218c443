//! # PhishBlock
//!
//! A URL phishing classifier built on word-boundary character n-grams.
//!
//! ## Features
//!
//! - Character n-gram tokenization with word padding
//! - Frequency-capped vocabulary and smoothed TF-IDF encoding
//! - Logistic regression training with a stratified held-out evaluation
//! - A portable JSON artifact with IDF folded into the weights
//! - Deterministic linear scoring of single URLs or batches
//!
//! ## Scoring
//!
//! ```
//! use phishblock::model::{ModelArtifact, score};
//!
//! let artifact = ModelArtifact::from_json_str(
//!     r#"{"vocabulary": {"goo": 0, "ogl": 1},
//!         "weights": {"goo": 0.5, "ogl": -0.2},
//!         "intercept": 0.1,
//!         "ngram_range": [3, 3],
//!         "max_features": 5000}"#,
//! )
//! .unwrap();
//!
//! let prediction = score("google", &artifact);
//! assert!((prediction.score - 0.31213203435596426).abs() < 1e-9);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod feature;
pub mod model;
pub mod pipeline;

pub mod prelude {
    pub use crate::analysis::{CharWbTokenizer, NgramRange, Tokenizer};
    pub use crate::config::TrainingConfig;
    pub use crate::corpus::{Corpus, LabeledUrl};
    pub use crate::error::{PhishBlockError, Result};
    pub use crate::feature::{FeatureVector, TfIdfVectorizer, Vocabulary, VocabularyBuilder};
    pub use crate::model::{Label, LinearScorer, ModelArtifact, Prediction, score};
    pub use crate::pipeline::Pipeline;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
