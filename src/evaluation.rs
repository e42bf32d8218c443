//! Binary classification metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PhishBlockError, Result};
use crate::model::types::Label;

/// Counts of a binary confusion matrix, phishing being the positive class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[Label], y_pred: &[Label]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PhishBlockError::invalid_argument(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut matrix = Self::default();
        for (truth, prediction) in y_true.iter().zip(y_pred) {
            match (truth, prediction) {
                (Label::Benign, Label::Benign) => matrix.true_negative += 1,
                (Label::Benign, Label::Phishing) => matrix.false_positive += 1,
                (Label::Phishing, Label::Benign) => matrix.false_negative += 1,
                (Label::Phishing, Label::Phishing) => matrix.true_positive += 1,
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    fn class_metrics(&self, label: Label) -> ClassMetrics {
        let (hits, predicted, actual) = match label {
            Label::Benign => (
                self.true_negative,
                self.true_negative + self.false_negative,
                self.true_negative + self.false_positive,
            ),
            Label::Phishing => (
                self.true_positive,
                self.true_positive + self.false_positive,
                self.true_positive + self.false_negative,
            ),
        };
        let precision = ratio(hits, predicted);
        let recall = ratio(hits, actual);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support: actual,
        }
    }
}

/// Zero when the denominator is zero.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Precision, recall and F1 for one class or average.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and averaged metrics of a held-out evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub benign: ClassMetrics,
    pub phishing: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn from_labels(y_true: &[Label], y_pred: &[Label]) -> Result<Self> {
        Ok(Self::from_confusion(ConfusionMatrix::from_labels(
            y_true, y_pred,
        )?))
    }

    pub fn from_confusion(confusion: ConfusionMatrix) -> Self {
        let benign = confusion.class_metrics(Label::Benign);
        let phishing = confusion.class_metrics(Label::Phishing);
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (benign.precision + phishing.precision) / 2.0,
            recall: (benign.recall + phishing.recall) / 2.0,
            f1: (benign.f1 + phishing.f1) / 2.0,
            support: total,
        };

        let weighted = |field: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (field(&benign) * benign.support as f64 + field(&phishing) * phishing.support as f64)
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Self {
            benign,
            phishing,
            accuracy: ratio(confusion.true_negative + confusion.true_positive, total),
            macro_avg,
            weighted_avg,
            confusion,
        }
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        match label {
            Label::Benign => &self.benign,
            Label::Phishing => &self.phishing,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 12;

        fn row(f: &mut fmt::Formatter<'_>, name: &str, metrics: &ClassMetrics) -> fmt::Result {
            writeln!(
                f,
                "{name:>WIDTH$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                metrics.precision, metrics.recall, metrics.f1, metrics.support
            )
        }

        writeln!(
            f,
            "{:>WIDTH$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for label in Label::ALL {
            row(f, &label.to_string(), self.class(label))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>WIDTH$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}
