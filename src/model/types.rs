//! Common types for URL classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PhishBlockError, Result};

/// Binary class of a URL, serialized as `0` or `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
    /// Legitimate URL.
    Benign,
    /// Phishing URL.
    Phishing,
}

impl Label {
    /// Both classes in label order.
    pub const ALL: [Label; 2] = [Label::Benign, Label::Phishing];

    /// Decision for a raw linear score: non-negative scores are phishing.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.0 {
            Label::Phishing
        } else {
            Label::Benign
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Label::Benign => 0,
            Label::Phishing => 1,
        }
    }

    pub const fn is_phishing(self) -> bool {
        matches!(self, Label::Phishing)
    }

    /// Human-readable class name.
    pub const fn name(self) -> &'static str {
        match self {
            Label::Benign => "benign",
            Label::Phishing => "phishing",
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = PhishBlockError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Label::Benign),
            1 => Ok(Label::Phishing),
            other => Err(PhishBlockError::invalid_argument(format!(
                "label must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Logistic link, evaluated without overflow for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Result of scoring one URL.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Raw linear score (log-odds).
    pub score: f64,
    /// Class decision at score 0.
    pub label: Label,
    /// Logistic transform of the score, in `[0, 1]`.
    pub probability: f64,
}

impl Prediction {
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            label: Label::from_score(score),
            probability: sigmoid(score),
        }
    }
}

/// Contribution of one vocabulary term to a score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// The n-gram.
    pub term: String,
    /// Normalized feature value.
    pub value: f64,
    /// Exported weight of the term.
    pub weight: f64,
    /// `value * weight`.
    pub contribution: f64,
}

/// A prediction together with the terms that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub prediction: Prediction,
    pub intercept: f64,
    /// Sorted by decreasing absolute contribution.
    pub contributions: Vec<Contribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_score() {
        assert_eq!(Label::from_score(0.0), Label::Phishing);
        assert_eq!(Label::from_score(1e-300), Label::Phishing);
        assert_eq!(Label::from_score(-1e-300), Label::Benign);
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_string(&Label::Phishing).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Label>("0").unwrap(), Label::Benign);
        assert!(serde_json::from_str::<Label>("2").is_err());
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!(!sigmoid(-1000.0).is_nan());
    }

    #[test]
    fn test_prediction_from_score() {
        let prediction = Prediction::from_score(-0.25);
        assert_eq!(prediction.label, Label::Benign);
        assert!(prediction.probability < 0.5);
    }
}
