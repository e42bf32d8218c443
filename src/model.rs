//! Linear URL classifier: training, export and scoring.

pub mod artifact;
pub mod scorer;
pub mod trainer;
pub mod types;

pub use artifact::ModelArtifact;
pub use scorer::{LinearScorer, score};
pub use trainer::{
    LinearCoefficients, LinearTrainer, LogisticRegression, LogisticRegressionConfig, TrainingStats,
};
pub use types::{Contribution, Explanation, Label, Prediction, sigmoid};
