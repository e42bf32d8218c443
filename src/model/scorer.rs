//! Linear scoring of URLs against an exported artifact.
//!
//! The artifact weights already carry IDF, so the scorer counts n-grams,
//! L2-normalizes the raw counts over the vocabulary and takes the dot product
//! with the weights.

use rayon::prelude::*;

use crate::analysis::term_counts::TermCounts;
use crate::analysis::tokenizer::{CharWbTokenizer, Tokenizer};
use crate::feature::tfidf::{IdfWeights, encode};
use crate::feature::vector::FeatureVector;
use crate::model::artifact::ModelArtifact;
use crate::model::types::{Contribution, Explanation, Prediction};

/// Scorer bound to one loaded artifact.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    artifact: ModelArtifact,
    tokenizer: CharWbTokenizer,
}

impl LinearScorer {
    pub fn new(artifact: ModelArtifact) -> Self {
        let tokenizer = CharWbTokenizer::from_range(artifact.ngram_range());
        Self {
            artifact,
            tokenizer,
        }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Normalized feature vector of `url` in the artifact's index space.
    pub fn features(&self, url: &str) -> FeatureVector {
        let counts = TermCounts::from_tokens(self.tokenizer.tokenize(url));
        encode(&counts, self.artifact.vocabulary(), &IdfWeights::Folded)
    }

    /// Raw linear score of a feature vector.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        features.dot(self.artifact.weights()) + self.artifact.intercept()
    }

    /// Score one URL.
    pub fn score(&self, url: &str) -> Prediction {
        Prediction::from_score(self.decision_function(&self.features(url)))
    }

    /// Score many URLs in parallel, preserving input order.
    pub fn score_batch<S>(&self, urls: &[S]) -> Vec<Prediction>
    where
        S: AsRef<str> + Sync,
    {
        urls.par_iter().map(|url| self.score(url.as_ref())).collect()
    }

    /// Score one URL and list the terms that contributed.
    pub fn explain(&self, url: &str) -> Explanation {
        let features = self.features(url);
        let prediction = Prediction::from_score(self.decision_function(&features));

        let mut contributions: Vec<Contribution> = features
            .iter()
            .map(|(index, value)| {
                let weight = self.artifact.weights()[index];
                Contribution {
                    term: self
                        .artifact
                        .vocabulary()
                        .term(index)
                        .unwrap_or_default()
                        .to_string(),
                    value,
                    weight,
                    contribution: value * weight,
                }
            })
            .collect();
        contributions.sort_by(|a, b| {
            b.contribution
                .abs()
                .total_cmp(&a.contribution.abs())
                .then_with(|| a.term.cmp(&b.term))
        });

        Explanation {
            prediction,
            intercept: self.artifact.intercept(),
            contributions,
        }
    }
}

/// Score a single URL against an artifact.
///
/// Total over every input string: a URL sharing no n-gram with the
/// vocabulary scores exactly the intercept.
pub fn score(url: &str, artifact: &ModelArtifact) -> Prediction {
    let tokenizer = CharWbTokenizer::from_range(artifact.ngram_range());
    let counts = TermCounts::from_tokens(tokenizer.tokenize(url));
    let features = encode(&counts, artifact.vocabulary(), &IdfWeights::Folded);
    Prediction::from_score(features.dot(artifact.weights()) + artifact.intercept())
}
