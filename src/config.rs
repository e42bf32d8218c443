//! Training configuration.
//!
//! Every section has defaults matching the reference model: n-grams of 3 to 5
//! characters, 5000 features, a stratified 80/20 split seeded with 42 and a
//! class-balanced logistic regression with `C = 1`.
//!
//! ```json
//! {
//!   "vectorizer": { "ngram_range": [3, 5], "max_features": 5000 },
//!   "split": { "test_size": 0.2, "seed": 42 },
//!   "classifier": { "c": 1.0, "balanced": true }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::NgramRange;
use crate::error::{PhishBlockError, Result};
use crate::feature::tfidf::NormOrder;
use crate::feature::vocabulary::{FrequencyMeasure, IndexOrder, VocabularyBuilder};
use crate::model::trainer::LogisticRegressionConfig;

/// Feature extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Inclusive n-gram length range.
    pub ngram_range: NgramRange,
    /// Vocabulary size cap.
    pub max_features: usize,
    /// Frequency used to rank terms for the cap.
    pub frequency_measure: FrequencyMeasure,
    /// Index assignment order of the kept terms.
    pub index_order: IndexOrder,
    /// Order of IDF weighting and L2 normalization for training rows.
    pub norm_order: NormOrder,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: NgramRange::default(),
            max_features: 5000,
            frequency_measure: FrequencyMeasure::default(),
            index_order: IndexOrder::default(),
            norm_order: NormOrder::default(),
        }
    }
}

impl VectorizerConfig {
    pub fn vocabulary_builder(&self) -> VocabularyBuilder {
        VocabularyBuilder::new(self.max_features)
            .with_measure(self.frequency_measure)
            .with_index_order(self.index_order)
    }
}

/// Train/test partition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of each class held out for evaluation.
    pub test_size: f64,
    /// Shuffle seed.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Complete training configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub vectorizer: VectorizerConfig,
    pub split: SplitConfig,
    pub classifier: LogisticRegressionConfig,
}

impl TrainingConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PhishBlockError::invalid_argument(format!(
                "failed to read config {}: {e}",
                path.display()
            ))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vectorizer.max_features == 0 {
            return Err(PhishBlockError::invalid_argument(
                "vectorizer.max_features must be at least 1",
            ));
        }
        let test_size = self.split.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PhishBlockError::invalid_argument(format!(
                "split.test_size must be between 0 and 1, got {test_size}"
            )));
        }
        self.classifier.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.vectorizer.ngram_range, NgramRange::new(3, 5).unwrap());
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.vectorizer.norm_order, NormOrder::IdfThenL2);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.classifier.c, 1.0);
        assert!(config.classifier.balanced);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "vectorizer": {
                "ngram_range": [2, 4],
                "frequency_measure": "term_frequency",
                "norm_order": "l2_then_idf"
            },
            "classifier": { "max_iter": 50 }
        }"#;
        let config: TrainingConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.vectorizer.ngram_range, NgramRange::new(2, 4).unwrap());
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(
            config.vectorizer.frequency_measure,
            FrequencyMeasure::TermFrequency
        );
        assert_eq!(config.vectorizer.index_order, IndexOrder::Lexicographic);
        assert_eq!(config.vectorizer.norm_order, NormOrder::L2ThenIdf);
        assert_eq!(config.classifier.max_iter, 50);
        assert_eq!(config.split, SplitConfig::default());
    }

    #[test]
    fn test_invalid_ngram_range_rejected() {
        let json = r#"{ "vectorizer": { "ngram_range": [5, 3] } }"#;
        assert!(serde_json::from_str::<TrainingConfig>(json).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = TrainingConfig::default();
        config.vectorizer.max_features = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.split.test_size = 1.5;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.classifier.tolerance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "split": { "seed": 7 } }"#).unwrap();

        let config = TrainingConfig::from_file(&path).unwrap();
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.test_size, 0.2);

        assert!(TrainingConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
