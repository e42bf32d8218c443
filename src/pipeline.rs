//! End-to-end training: vectorize, split, train, export, evaluate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::CharWbTokenizer;
use crate::config::TrainingConfig;
use crate::corpus::{ClassCounts, Corpus};
use crate::error::{PhishBlockError, Result};
use crate::evaluation::ClassificationReport;
use crate::feature::tfidf::TfIdfVectorizer;
use crate::feature::vector::FeatureVector;
use crate::model::artifact::ModelArtifact;
use crate::model::scorer::LinearScorer;
use crate::model::trainer::{LinearTrainer, LogisticRegression, TrainingStats};
use crate::model::types::Label;

/// What a training run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub trained_at: DateTime<Utc>,
    pub trainer: String,
    /// Usable samples in the corpus.
    pub samples: usize,
    /// Rows dropped while reading the corpus.
    pub skipped_rows: usize,
    pub class_counts: ClassCounts,
    pub train_samples: usize,
    pub test_samples: usize,
    pub vocabulary_size: usize,
    pub stats: TrainingStats,
}

/// Exported artifact plus its held-out evaluation.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: ClassificationReport,
    pub summary: TrainingSummary,
}

/// Trains and exports URL classifiers.
pub struct Pipeline {
    config: TrainingConfig,
    trainer: Box<dyn LinearTrainer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("trainer", &self.trainer.name())
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline using logistic regression with the configured
    /// hyperparameters.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let trainer = Box::new(LogisticRegression::new(config.classifier.clone()));
        Ok(Self { config, trainer })
    }

    /// Replace the classifier.
    pub fn with_trainer(mut self, trainer: Box<dyn LinearTrainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit the vectorizer on every URL of the corpus and return its rows.
    pub fn fit_vectorizer(&self, corpus: &Corpus) -> Result<(TfIdfVectorizer, Vec<FeatureVector>)> {
        if corpus.is_empty() {
            return Err(PhishBlockError::corpus("corpus contains no labeled URLs"));
        }
        let settings = &self.config.vectorizer;
        let tokenizer = CharWbTokenizer::from_range(settings.ngram_range);

        log::info!("vectorizing {} URLs", corpus.len());
        let (vectorizer, rows) = TfIdfVectorizer::fit_transform_ordered(
            tokenizer,
            &settings.vocabulary_builder(),
            settings.norm_order,
            &corpus.urls(),
        );
        log::info!("vocabulary has {} terms", vectorizer.vocabulary_size());
        Ok((vectorizer, rows))
    }

    /// Train on the whole corpus and export, without holding out a test set.
    pub fn fit(&self, corpus: &Corpus) -> Result<ModelArtifact> {
        let (vectorizer, rows) = self.fit_vectorizer(corpus)?;
        log::info!("training {} on {} URLs", self.trainer.name(), rows.len());
        let coefficients =
            self.trainer
                .train(&rows, &corpus.labels(), vectorizer.vocabulary_size())?;
        ModelArtifact::from_training(
            &vectorizer,
            &coefficients,
            self.config.vectorizer.max_features,
        )
    }

    /// Train on a stratified split and evaluate the exported artifact on the
    /// held-out URLs.
    pub fn train_and_evaluate(&self, corpus: &Corpus) -> Result<TrainingOutcome> {
        let (vectorizer, rows) = self.fit_vectorizer(corpus)?;

        log::info!("splitting data");
        let split = corpus.stratified_split(self.config.split.test_size, self.config.split.seed)?;
        let samples = corpus.samples();
        let train_rows: Vec<FeatureVector> =
            split.train.iter().map(|&i| rows[i].clone()).collect();
        let train_labels: Vec<Label> = split.train.iter().map(|&i| samples[i].label).collect();

        log::info!(
            "training {} on {} URLs",
            self.trainer.name(),
            train_rows.len()
        );
        let coefficients =
            self.trainer
                .train(&train_rows, &train_labels, vectorizer.vocabulary_size())?;
        let artifact = ModelArtifact::from_training(
            &vectorizer,
            &coefficients,
            self.config.vectorizer.max_features,
        )?;

        log::info!("evaluating on {} held-out URLs", split.test.len());
        let scorer = LinearScorer::new(artifact.clone());
        let test_urls: Vec<&str> = split.test.iter().map(|&i| samples[i].url.as_str()).collect();
        let y_true: Vec<Label> = split.test.iter().map(|&i| samples[i].label).collect();
        let y_pred: Vec<Label> = scorer
            .score_batch(&test_urls)
            .into_iter()
            .map(|prediction| prediction.label)
            .collect();
        let report = ClassificationReport::from_labels(&y_true, &y_pred)?;

        let summary = TrainingSummary {
            trained_at: Utc::now(),
            trainer: self.trainer.name().to_string(),
            samples: corpus.len(),
            skipped_rows: corpus.skipped(),
            class_counts: corpus.class_counts(),
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            vocabulary_size: artifact.len(),
            stats: coefficients.stats,
        };

        Ok(TrainingOutcome {
            artifact,
            report,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::LabeledUrl;
    use crate::feature::tfidf::NormOrder;
    use crate::model::trainer::LinearCoefficients;

    fn small_corpus() -> Corpus {
        let benign = [
            "https://www.google.com",
            "https://github.com/rust-lang/rust",
            "https://en.wikipedia.org/wiki/Rust",
            "https://docs.rs/serde",
            "https://www.example.org/about",
        ];
        let phishing = [
            "http://login-secure-bank.com.xyz/verify",
            "http://paypal-account-verify.top/login",
            "http://secure-update-appleid.xyz/signin",
            "http://verify-login-bank.top/account",
            "http://account-login-secure.xyz/update",
        ];
        let mut samples = Vec::new();
        for url in benign {
            samples.push(LabeledUrl::new(url, Label::Benign));
        }
        for url in phishing {
            samples.push(LabeledUrl::new(url, Label::Phishing));
        }
        Corpus::new(samples)
    }

    /// Always returns the same coefficient for every feature.
    struct ConstantTrainer(f64);

    impl LinearTrainer for ConstantTrainer {
        fn train(
            &self,
            _rows: &[FeatureVector],
            _labels: &[Label],
            n_features: usize,
        ) -> Result<LinearCoefficients> {
            Ok(LinearCoefficients {
                coefficients: vec![self.0; n_features],
                intercept: -0.5,
                stats: TrainingStats {
                    iterations: 0,
                    converged: true,
                    final_loss: 0.0,
                },
            })
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    #[test]
    fn test_fit_exports_artifact() {
        let pipeline = Pipeline::new(TrainingConfig::default()).unwrap();
        let artifact = pipeline.fit(&small_corpus()).unwrap();

        assert!(!artifact.is_empty());
        assert!(artifact.len() <= 5000);
        assert_eq!(artifact.weights().len(), artifact.vocabulary().len());
        assert_eq!(artifact.max_features(), 5000);
        assert_eq!(artifact.ngram_range().min_n(), 3);
        assert_eq!(artifact.ngram_range().max_n(), 5);
    }

    #[test]
    fn test_fit_separates_training_data() {
        let corpus = small_corpus();
        let pipeline = Pipeline::new(TrainingConfig::default()).unwrap();
        let scorer = LinearScorer::new(pipeline.fit(&corpus).unwrap());

        for sample in corpus.samples() {
            assert_eq!(scorer.score(&sample.url).label, sample.label, "{}", sample.url);
        }
    }

    #[test]
    fn test_vocabulary_cap() {
        let mut config = TrainingConfig::default();
        config.vectorizer.max_features = 10;
        let pipeline = Pipeline::new(config).unwrap();
        let artifact = pipeline.fit(&small_corpus()).unwrap();
        assert_eq!(artifact.len(), 10);
        assert_eq!(artifact.max_features(), 10);
    }

    #[test]
    fn test_weights_fold_idf() {
        let pipeline = Pipeline::new(TrainingConfig::default())
            .unwrap()
            .with_trainer(Box::new(ConstantTrainer(2.0)));
        let corpus = small_corpus();
        let (vectorizer, _) = pipeline.fit_vectorizer(&corpus).unwrap();
        let artifact = pipeline.fit(&corpus).unwrap();

        assert_eq!(artifact.intercept(), -0.5);
        for (term, index) in vectorizer.vocabulary().iter() {
            let expected = 2.0 * vectorizer.idf().get(index);
            assert_eq!(artifact.weight(term), Some(expected));
        }
    }

    #[test]
    fn test_l2_then_idf_artifact_reproduces_trained_scores() {
        let corpus = small_corpus();
        let mut config = TrainingConfig::default();
        config.vectorizer.norm_order = NormOrder::L2ThenIdf;
        let pipeline = Pipeline::new(config).unwrap();
        let (vectorizer, rows) = pipeline.fit_vectorizer(&corpus).unwrap();
        let coefficients = LogisticRegression::new(pipeline.config().classifier.clone())
            .train(&rows, &corpus.labels(), vectorizer.vocabulary_size())
            .unwrap();
        let artifact = ModelArtifact::from_training(&vectorizer, &coefficients, 5000).unwrap();
        let scorer = LinearScorer::new(artifact);

        for (sample, row) in corpus.samples().iter().zip(&rows) {
            let trained = coefficients.intercept + row.dot(&coefficients.coefficients);
            let exported = scorer.score(&sample.url).score;
            assert!(
                (trained - exported).abs() < 1e-9,
                "{}: trained {trained}, exported {exported}",
                sample.url
            );
        }
    }

    #[test]
    fn test_train_and_evaluate() {
        let pipeline = Pipeline::new(TrainingConfig::default()).unwrap();
        let outcome = pipeline.train_and_evaluate(&small_corpus()).unwrap();

        assert_eq!(outcome.summary.samples, 10);
        assert_eq!(outcome.summary.train_samples, 8);
        assert_eq!(outcome.summary.test_samples, 2);
        assert_eq!(outcome.summary.trainer, "logistic_regression");
        assert_eq!(outcome.report.confusion.total(), 2);
        assert_eq!(outcome.report.benign.support, 1);
        assert_eq!(outcome.report.phishing.support, 1);
        assert_eq!(outcome.summary.vocabulary_size, outcome.artifact.len());
    }

    #[test]
    fn test_empty_corpus() {
        let pipeline = Pipeline::new(TrainingConfig::default()).unwrap();
        let result = pipeline.fit(&Corpus::default());
        assert!(matches!(result, Err(PhishBlockError::Corpus(_))));
    }

    #[test]
    fn test_single_class_corpus() {
        let corpus = Corpus::new(vec![
            LabeledUrl::new("https://a.example", Label::Benign),
            LabeledUrl::new("https://b.example", Label::Benign),
        ]);
        let pipeline = Pipeline::new(TrainingConfig::default()).unwrap();
        assert!(matches!(
            pipeline.fit(&corpus),
            Err(PhishBlockError::Training(_))
        ));
        assert!(matches!(
            pipeline.train_and_evaluate(&corpus),
            Err(PhishBlockError::Corpus(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = TrainingConfig::default();
        config.split.test_size = 0.0;
        assert!(Pipeline::new(config).is_err());
    }
}
