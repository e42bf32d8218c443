//! Error types for the PhishBlock library.
//!
//! All fallible operations return [`PhishBlockError`] through the crate-wide
//! [`Result`] alias. Feature extraction and scoring are total over every input
//! string and never produce an error; failures only come from artifact I/O,
//! schema validation, corpus loading, configuration and training.
//!
//! # Examples
//!
//! ```
//! use phishblock::error::{PhishBlockError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PhishBlockError::invalid_argument("max_features must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for PhishBlock operations.
#[derive(Error, Debug)]
pub enum PhishBlockError {
    /// I/O errors outside of artifact loading (corpus files, CLI output).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors outside of artifact loading.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact file is missing, unreadable or not valid JSON.
    #[error("Load error: {0}")]
    Load(String),

    /// The artifact parsed but violates the export contract.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Tokenizer or vectorizer misconfiguration.
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Labeled corpus problems.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Classifier training failures.
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with PhishBlockError.
pub type Result<T> = std::result::Result<T, PhishBlockError>;

impl PhishBlockError {
    /// Create a new load error.
    pub fn load<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Load(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Schema(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Analysis(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Corpus(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Training(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PhishBlockError::Other(msg.into())
    }
}
