//! Linear classifier training.
//!
//! The pipeline only needs one real coefficient per vocabulary index plus an
//! intercept. [`LinearTrainer`] is the seam for whatever produces them;
//! [`LogisticRegression`] is the built-in implementation.

use serde::{Deserialize, Serialize};

use crate::error::{PhishBlockError, Result};
use crate::feature::vector::FeatureVector;
use crate::model::types::{Label, sigmoid};

/// Trained linear model parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCoefficients {
    /// One coefficient per feature index.
    pub coefficients: Vec<f64>,
    /// Bias term.
    pub intercept: f64,
    /// How training went.
    pub stats: TrainingStats,
}

/// Training statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Number of iterations completed.
    pub iterations: usize,
    /// Whether the gradient fell below tolerance before `max_iter`.
    pub converged: bool,
    /// Regularized objective at the returned parameters.
    pub final_loss: f64,
}

/// Trainer producing linear coefficients from sparse rows and labels.
pub trait LinearTrainer: Send + Sync {
    /// Fit one coefficient per feature plus an intercept.
    ///
    /// # Arguments
    /// * `rows` - Feature vectors, one per sample
    /// * `labels` - Class of each sample
    /// * `n_features` - Dimension of the feature space
    fn train(
        &self,
        rows: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
    ) -> Result<LinearCoefficients>;

    /// Get the name of this trainer for debugging and logging.
    fn name(&self) -> &str;
}

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Weight samples by `n / (2 * n_class)`.
    pub balanced: bool,
    /// Gradient descent step size.
    pub learning_rate: f64,
    /// Maximum number of gradient steps.
    pub max_iter: usize,
    /// Stop when every gradient component is below this.
    pub tolerance: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            balanced: true,
            learning_rate: 1.0,
            max_iter: 1000,
            tolerance: 1e-5,
        }
    }
}

impl LogisticRegressionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(PhishBlockError::invalid_argument(format!(
                "classifier.c must be positive, got {}",
                self.c
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PhishBlockError::invalid_argument(format!(
                "classifier.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_iter == 0 {
            return Err(PhishBlockError::invalid_argument(
                "classifier.max_iter must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(PhishBlockError::invalid_argument(format!(
                "classifier.tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// L2-regularized logistic regression fitted by full-batch gradient descent.
///
/// Minimizes `0.5 * (|w|^2 + b^2) + C * sum_i s_i * log(1 + exp(-y_i * z_i))`
/// where `s_i` is the sample weight. The intercept is penalized like any
/// other weight. The objective is divided by `C * sum_i s_i` so that the step
/// size does not depend on the corpus size.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
}

impl LogisticRegression {
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    fn sample_weights(&self, labels: &[Label]) -> Vec<f64> {
        if !self.config.balanced {
            return vec![1.0; labels.len()];
        }
        let n = labels.len() as f64;
        let phishing = labels.iter().filter(|label| label.is_phishing()).count() as f64;
        let benign = n - phishing;
        labels
            .iter()
            .map(|label| {
                let class_count = if label.is_phishing() { phishing } else { benign };
                n / (2.0 * class_count)
            })
            .collect()
    }
}

/// `ln(1 + e^x)` without overflow.
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

impl LinearTrainer for LogisticRegression {
    fn train(
        &self,
        rows: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
    ) -> Result<LinearCoefficients> {
        self.config.validate()?;
        if rows.len() != labels.len() {
            return Err(PhishBlockError::training(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if rows.is_empty() {
            return Err(PhishBlockError::training("no training samples"));
        }
        if !(labels.contains(&Label::Benign) && labels.contains(&Label::Phishing)) {
            return Err(PhishBlockError::training(
                "training samples must contain both classes",
            ));
        }

        let sample_weights = self.sample_weights(labels);
        let total_weight: f64 = sample_weights.iter().sum();
        let lambda = 1.0 / (self.config.c * total_weight);

        let mut weights = vec![0.0; n_features];
        let mut intercept = 0.0;
        let mut gradient = vec![0.0; n_features];
        let mut stats = TrainingStats {
            iterations: 0,
            converged: false,
            final_loss: f64::NAN,
        };

        for iteration in 0..self.config.max_iter {
            gradient.iter_mut().for_each(|g| *g = 0.0);
            let mut intercept_gradient = 0.0;
            let mut loss = 0.0;

            for ((row, label), sample_weight) in rows.iter().zip(labels).zip(&sample_weights) {
                let z = row.dot(&weights) + intercept;
                let (target, sign) = if label.is_phishing() {
                    (1.0, 1.0)
                } else {
                    (0.0, -1.0)
                };
                let residual = sample_weight * (sigmoid(z) - target) / total_weight;
                for (index, value) in row.iter() {
                    if let Some(g) = gradient.get_mut(index) {
                        *g += residual * value;
                    }
                }
                intercept_gradient += residual;
                loss += sample_weight * softplus(-sign * z) / total_weight;
            }

            let mut squared_norm = intercept * intercept;
            for (g, w) in gradient.iter_mut().zip(&weights) {
                *g += lambda * w;
                squared_norm += w * w;
            }
            intercept_gradient += lambda * intercept;
            loss += 0.5 * lambda * squared_norm;

            stats.iterations = iteration + 1;
            stats.final_loss = loss;

            let max_gradient = gradient
                .iter()
                .fold(intercept_gradient.abs(), |acc, g| acc.max(g.abs()));
            if iteration % 100 == 0 {
                log::debug!(
                    "iteration {iteration}: loss {loss:.6}, max gradient {max_gradient:.3e}"
                );
            }
            if max_gradient < self.config.tolerance {
                stats.converged = true;
                break;
            }

            for (w, g) in weights.iter_mut().zip(&gradient) {
                *w -= self.config.learning_rate * g;
            }
            intercept -= self.config.learning_rate * intercept_gradient;
        }

        if !stats.converged {
            log::warn!(
                "logistic regression stopped after {} iterations without converging",
                stats.iterations
            );
        }

        Ok(LinearCoefficients {
            coefficients: weights,
            intercept,
            stats,
        })
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_problem() -> (Vec<FeatureVector>, Vec<Label>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..3 {
            rows.push(FeatureVector::from_entries(vec![(0, 1.0)]));
            labels.push(Label::Phishing);
            rows.push(FeatureVector::from_entries(vec![(1, 1.0)]));
            labels.push(Label::Benign);
        }
        (rows, labels)
    }

    #[test]
    fn test_learns_separable_problem() {
        let (rows, labels) = toy_problem();
        let model = LogisticRegression::default().train(&rows, &labels, 2).unwrap();

        assert!(model.coefficients[0] > 0.0);
        assert!(model.coefficients[1] < 0.0);
        for (row, label) in rows.iter().zip(&labels) {
            let score = row.dot(&model.coefficients) + model.intercept;
            assert_eq!(Label::from_score(score), *label);
        }
        assert!(model.stats.iterations > 0);
        assert!(model.stats.final_loss.is_finite());
    }

    #[test]
    fn test_training_is_deterministic() {
        let (rows, labels) = toy_problem();
        let trainer = LogisticRegression::default();
        let first = trainer.train(&rows, &labels, 2).unwrap();
        let second = trainer.train(&rows, &labels, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_balanced_weights() {
        let trainer = LogisticRegression::default();
        let labels = [Label::Phishing, Label::Benign, Label::Benign, Label::Benign];
        let weights = trainer.sample_weights(&labels);
        assert_eq!(weights, vec![2.0, 4.0 / 6.0, 4.0 / 6.0, 4.0 / 6.0]);

        let trainer = LogisticRegression::new(LogisticRegressionConfig {
            balanced: false,
            ..Default::default()
        });
        assert_eq!(trainer.sample_weights(&labels), vec![1.0; 4]);
    }

    #[test]
    fn test_rejects_single_class() {
        let rows = vec![FeatureVector::from_entries(vec![(0, 1.0)])];
        let result = LogisticRegression::default().train(&rows, &[Label::Phishing], 1);
        assert!(matches!(result, Err(PhishBlockError::Training(_))));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let (rows, _) = toy_problem();
        let result = LogisticRegression::default().train(&rows, &[Label::Phishing], 2);
        assert!(matches!(result, Err(PhishBlockError::Training(_))));
    }

    #[test]
    fn test_config_validation() {
        let config = LogisticRegressionConfig {
            c: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(LogisticRegressionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_softplus() {
        assert!((softplus(0.0) - 2.0f64.ln()).abs() < 1e-15);
        assert_eq!(softplus(1000.0), 1000.0);
        assert_eq!(softplus(-1000.0), 0.0);
    }
}
