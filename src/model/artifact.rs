//! Portable model artifact: the export contract between training and scoring.
//!
//! The artifact is a JSON object with exactly five keys:
//!
//! ```text
//! {
//!   "vocabulary":   { "<ngram>": <index>, ... },
//!   "weights":      { "<ngram>": <weight>, ... },
//!   "intercept":    <number>,
//!   "ngram_range":  [<min_n>, <max_n>],
//!   "max_features": <integer>
//! }
//! ```
//!
//! Each weight already has the term's IDF folded in, so a scoring runtime
//! needs nothing from the training run beyond this file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

use crate::analysis::tokenizer::NgramRange;
use crate::error::{PhishBlockError, Result};
use crate::feature::tfidf::TfIdfVectorizer;
use crate::feature::vocabulary::Vocabulary;
use crate::model::trainer::LinearCoefficients;

const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Validated, immutable scoring artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelArtifact {
    vocabulary: Vocabulary,
    /// Weight per vocabulary index.
    weights: Vec<f64>,
    intercept: f64,
    ngram_range: NgramRange,
    max_features: usize,
}

/// Borrowed view used for serialization. Field order matches the exporter.
#[derive(Serialize)]
struct ArtifactRef<'a> {
    vocabulary: BTreeMap<&'a str, usize>,
    weights: BTreeMap<&'a str, f64>,
    intercept: f64,
    ngram_range: NgramRange,
    max_features: usize,
}

/// Wire shape accepted on load, before contract checks.
#[derive(Deserialize)]
struct RawArtifact {
    vocabulary: BTreeMap<String, i64>,
    weights: BTreeMap<String, f64>,
    intercept: f64,
    ngram_range: Vec<i64>,
    max_features: i64,
}

impl ModelArtifact {
    /// Assemble an artifact from a vocabulary and one weight per index.
    ///
    /// # Errors
    ///
    /// Returns a schema error if the weight count differs from the
    /// vocabulary size, the vocabulary exceeds `max_features`, or any number
    /// is not finite.
    pub fn new(
        vocabulary: Vocabulary,
        weights: Vec<f64>,
        intercept: f64,
        ngram_range: NgramRange,
        max_features: usize,
    ) -> Result<Self> {
        if weights.len() != vocabulary.len() {
            return Err(PhishBlockError::schema(format!(
                "{} weights for {} vocabulary terms",
                weights.len(),
                vocabulary.len()
            )));
        }
        if vocabulary.len() > max_features {
            return Err(PhishBlockError::schema(format!(
                "vocabulary has {} terms, more than max_features {max_features}",
                vocabulary.len()
            )));
        }
        if let Some((index, weight)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite()) {
            return Err(PhishBlockError::schema(format!(
                "weight {weight} for {:?} is not finite",
                vocabulary.term(index).unwrap_or_default()
            )));
        }
        if !intercept.is_finite() {
            return Err(PhishBlockError::schema(format!(
                "intercept {intercept} is not finite"
            )));
        }

        Ok(Self {
            vocabulary,
            weights,
            intercept,
            ngram_range,
            max_features,
        })
    }

    /// Fold IDF into trained coefficients and export.
    ///
    /// The exported weight of term `i` is `coefficients[i] * idf[i]`.
    pub fn from_training(
        vectorizer: &TfIdfVectorizer,
        coefficients: &LinearCoefficients,
        max_features: usize,
    ) -> Result<Self> {
        let idf = vectorizer.idf();
        let weights = coefficients
            .coefficients
            .iter()
            .enumerate()
            .map(|(index, coefficient)| coefficient * idf.get(index))
            .collect();

        Self::new(
            vectorizer.vocabulary().clone(),
            weights,
            coefficients.intercept,
            vectorizer.tokenizer().range(),
            max_features,
        )
    }

    /// Load and validate an artifact file.
    ///
    /// # Errors
    ///
    /// - [`PhishBlockError::Load`] if the file is missing, unreadable or not
    ///   a well-formed artifact document
    /// - [`PhishBlockError::Schema`] if the document violates the contract
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PhishBlockError::load(format!("cannot open {}: {e}", path.display()))
        })?;

        let artifact = Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            PhishBlockError::Load(msg) => {
                PhishBlockError::load(format!("{}: {msg}", path.display()))
            }
            PhishBlockError::Schema(msg) => {
                PhishBlockError::schema(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;

        log::info!(
            "loaded model from {} ({} terms, ngram_range {})",
            path.display(),
            artifact.len(),
            artifact.ngram_range
        );
        Ok(artifact)
    }

    /// Parse and validate an artifact from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_reader(reader)
            .map_err(|e| PhishBlockError::load(format!("malformed artifact: {e}")))?;
        Self::try_from(raw)
    }

    /// Parse and validate an artifact from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_reader(json.as_bytes())
    }

    /// Write the artifact to `path`.
    ///
    /// The document is written to a sibling temporary file first and renamed
    /// over `path`, so readers never observe a partial file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp_path = PathBuf::from(format!("{}{TEMP_FILE_SUFFIX}", path.display()));

        let written = File::create(&temp_path)
            .map_err(PhishBlockError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                self.to_writer(&mut writer)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&temp_path, path).map_err(PhishBlockError::from));

        if written.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        written?;

        log::info!("exported model to {} ({} terms)", path.display(), self.len());
        Ok(())
    }

    /// Serialize as compact JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Serialize to a JSON string.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Weights indexed like the vocabulary.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of `term`, if it is in the vocabulary.
    pub fn weight(&self, term: &str) -> Option<f64> {
        self.vocabulary
            .get(term)
            .and_then(|index| self.weights.get(index).copied())
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn ngram_range(&self) -> NgramRange {
        self.ngram_range
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Number of vocabulary terms.
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Terms ordered by weight, most phishing-indicative first.
    pub fn ranked_terms(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .vocabulary
            .iter()
            .map(|(term, index)| (term, self.weights[index]))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

impl Serialize for ModelArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let view = ArtifactRef {
            vocabulary: self.vocabulary.iter().collect(),
            weights: self
                .vocabulary
                .iter()
                .map(|(term, index)| (term, self.weights[index]))
                .collect(),
            intercept: self.intercept,
            ngram_range: self.ngram_range,
            max_features: self.max_features,
        };
        view.serialize(serializer)
    }
}

impl TryFrom<RawArtifact> for ModelArtifact {
    type Error = PhishBlockError;

    fn try_from(raw: RawArtifact) -> Result<Self> {
        let ngram_range = match raw.ngram_range.as_slice() {
            &[min_n, max_n] => {
                let min_n = usize::try_from(min_n).map_err(|_| {
                    PhishBlockError::schema(format!("ngram_range minimum {min_n} is negative"))
                })?;
                let max_n = usize::try_from(max_n).map_err(|_| {
                    PhishBlockError::schema(format!("ngram_range maximum {max_n} is negative"))
                })?;
                NgramRange::new(min_n, max_n)
                    .map_err(|e| PhishBlockError::schema(format!("invalid ngram_range: {e}")))?
            }
            other => {
                return Err(PhishBlockError::schema(format!(
                    "ngram_range must have exactly 2 elements, got {}",
                    other.len()
                )));
            }
        };

        let max_features = usize::try_from(raw.max_features)
            .ok()
            .filter(|&max_features| max_features > 0)
            .ok_or_else(|| {
                PhishBlockError::schema(format!(
                    "max_features must be a positive integer, got {}",
                    raw.max_features
                ))
            })?;

        check_key_parity(&raw.vocabulary, &raw.weights)?;

        let mut entries = Vec::with_capacity(raw.vocabulary.len());
        for (term, index) in raw.vocabulary {
            let index = usize::try_from(index).map_err(|_| {
                PhishBlockError::schema(format!("vocabulary index {index} for {term:?} is negative"))
            })?;
            entries.push((term, index));
        }
        let vocabulary = Vocabulary::from_index_map(entries)?;

        let mut weights = Vec::with_capacity(vocabulary.len());
        for (term, _) in vocabulary.iter() {
            // Key parity was checked above.
            let weight = raw.weights.get(term).copied().ok_or_else(|| {
                PhishBlockError::schema(format!("no weight for vocabulary term {term:?}"))
            })?;
            weights.push(weight);
        }

        Self::new(vocabulary, weights, raw.intercept, ngram_range, max_features)
    }
}

fn check_key_parity(
    vocabulary: &BTreeMap<String, i64>,
    weights: &BTreeMap<String, f64>,
) -> Result<()> {
    let vocabulary_keys: BTreeSet<&str> = vocabulary.keys().map(String::as_str).collect();
    let weight_keys: BTreeSet<&str> = weights.keys().map(String::as_str).collect();
    if vocabulary_keys == weight_keys {
        return Ok(());
    }

    let missing: Vec<&str> = vocabulary_keys.difference(&weight_keys).copied().collect();
    let extra: Vec<&str> = weight_keys.difference(&vocabulary_keys).copied().collect();
    let mut problems = Vec::new();
    if let Some(first) = missing.first() {
        problems.push(format!(
            "{} vocabulary terms have no weight (first: {first:?})",
            missing.len()
        ));
    }
    if let Some(first) = extra.first() {
        problems.push(format!(
            "{} weights have no vocabulary term (first: {first:?})",
            extra.len()
        ));
    }
    Err(PhishBlockError::schema(format!(
        "weights keys differ from vocabulary keys: {}",
        problems.join("; ")
    )))
}
