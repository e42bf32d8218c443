//! TF-IDF vectorizer for URL feature extraction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::term_counts::TermCounts;
use crate::analysis::tokenizer::{CharWbTokenizer, Tokenizer};
use crate::feature::vector::FeatureVector;
use crate::feature::vocabulary::{Vocabulary, VocabularyBuilder};

/// Inverse document frequency weights.
#[derive(Clone, Debug, PartialEq)]
pub enum IdfWeights {
    /// Smoothed IDF per vocabulary index, learned from a training corpus.
    Smoothed(Vec<f64>),
    /// IDF already folded into downstream weights; every term weighs 1.
    Folded,
}

impl IdfWeights {
    /// `idf = ln((1 + N) / (1 + df)) + 1` for each document frequency.
    pub fn smoothed(document_frequency: &[u64], n_documents: usize) -> Self {
        let n = n_documents as f64 + 1.0;
        Self::Smoothed(
            document_frequency
                .iter()
                .map(|&df| (n / (df as f64 + 1.0)).ln() + 1.0)
                .collect(),
        )
    }

    /// Weight of the term at `index`.
    pub fn get(&self, index: usize) -> f64 {
        match self {
            Self::Smoothed(idf) => idf.get(index).copied().unwrap_or(1.0),
            Self::Folded => 1.0,
        }
    }

    /// Learned weights, if any.
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Self::Smoothed(idf) => Some(idf),
            Self::Folded => None,
        }
    }
}

/// Order of IDF weighting and L2 normalization in the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormOrder {
    /// Weight raw counts by IDF, then normalize. Rows have unit norm.
    #[default]
    IdfThenL2,
    /// Normalize raw counts, then weight by IDF. Rows are the folded inference
    /// vector scaled by IDF, so an artifact with IDF folded into its weights
    /// reproduces the trained decision function exactly.
    L2ThenIdf,
}

/// TF-IDF vectorizer over word-boundary character n-grams.
///
/// Transform counts each vocabulary term, multiplies the raw count by the
/// term's IDF and L2-normalizes the result. Terms outside the vocabulary are
/// ignored. [`NormOrder::L2ThenIdf`] swaps the last two steps.
#[derive(Clone)]
pub struct TfIdfVectorizer {
    /// Tokenizer producing the n-grams.
    tokenizer: CharWbTokenizer,
    /// Vocabulary: term -> index mapping.
    vocabulary: Vocabulary,
    /// Inverse document frequency for each term.
    idf: IdfWeights,
    norm_order: NormOrder,
    /// Total number of documents seen during training (0 when rebuilt from an artifact).
    n_documents: usize,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("tokenizer", &self.tokenizer.name())
            .field("ngram_range", &self.tokenizer.range())
            .field("folded_idf", &matches!(self.idf, IdfWeights::Folded))
            .field("norm_order", &self.norm_order)
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Rebuild a transform-only vectorizer from an exported vocabulary.
    ///
    /// IDF is taken as already folded into the exported weights.
    pub fn from_vocabulary(tokenizer: CharWbTokenizer, vocabulary: Vocabulary) -> Self {
        Self {
            tokenizer,
            vocabulary,
            idf: IdfWeights::Folded,
            norm_order: NormOrder::default(),
            n_documents: 0,
        }
    }

    /// Fit the vectorizer on training documents.
    pub fn fit<S>(tokenizer: CharWbTokenizer, builder: &VocabularyBuilder, documents: &[S]) -> Self
    where
        S: AsRef<str> + Sync,
    {
        let counts = count_all(&tokenizer, documents);
        Self::fit_counts(tokenizer, builder, &counts)
    }

    /// Use `order` for every subsequent transform.
    pub fn with_norm_order(mut self, order: NormOrder) -> Self {
        self.norm_order = order;
        self
    }

    /// Fit on training documents and return their TF-IDF rows.
    pub fn fit_transform<S>(
        tokenizer: CharWbTokenizer,
        builder: &VocabularyBuilder,
        documents: &[S],
    ) -> (Self, Vec<FeatureVector>)
    where
        S: AsRef<str> + Sync,
    {
        Self::fit_transform_ordered(tokenizer, builder, NormOrder::default(), documents)
    }

    /// Like [`Self::fit_transform`] with an explicit [`NormOrder`].
    pub fn fit_transform_ordered<S>(
        tokenizer: CharWbTokenizer,
        builder: &VocabularyBuilder,
        norm_order: NormOrder,
        documents: &[S],
    ) -> (Self, Vec<FeatureVector>)
    where
        S: AsRef<str> + Sync,
    {
        let counts = count_all(&tokenizer, documents);
        let vectorizer = Self::fit_counts(tokenizer, builder, &counts).with_norm_order(norm_order);
        let rows = counts
            .par_iter()
            .map(|document| vectorizer.transform_counts(document))
            .collect();
        (vectorizer, rows)
    }

    fn fit_counts(
        tokenizer: CharWbTokenizer,
        builder: &VocabularyBuilder,
        counts: &[TermCounts],
    ) -> Self {
        let vocabulary = builder.build(counts);

        // Count document frequencies
        let mut document_frequency = vec![0u64; vocabulary.len()];
        for document in counts {
            for (term, _) in document.iter() {
                if let Some(index) = vocabulary.get(term) {
                    document_frequency[index] += 1;
                }
            }
        }

        let idf = IdfWeights::smoothed(&document_frequency, counts.len());
        log::debug!(
            "fitted TF-IDF vocabulary of {} terms over {} documents",
            vocabulary.len(),
            counts.len()
        );

        Self {
            tokenizer,
            vocabulary,
            idf,
            norm_order: NormOrder::default(),
            n_documents: counts.len(),
        }
    }

    /// Transform a URL into its TF-IDF feature vector.
    ///
    /// The vector has unit norm under [`NormOrder::IdfThenL2`].
    pub fn transform(&self, document: &str) -> FeatureVector {
        self.transform_counts(&TermCounts::from_tokens(self.tokenizer.tokenize(document)))
    }

    /// Transform already counted terms.
    pub fn transform_counts(&self, counts: &TermCounts) -> FeatureVector {
        match self.norm_order {
            NormOrder::IdfThenL2 => encode(counts, &self.vocabulary, &self.idf),
            NormOrder::L2ThenIdf => {
                let unit = encode(counts, &self.vocabulary, &IdfWeights::Folded);
                FeatureVector::from_entries(
                    unit.iter()
                        .map(|(index, value)| (index, value * self.idf.get(index)))
                        .collect(),
                )
            }
        }
    }

    /// Transform many URLs in parallel, preserving input order.
    pub fn transform_batch<S>(&self, documents: &[S]) -> Vec<FeatureVector>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|document| self.transform(document.as_ref()))
            .collect()
    }

    pub fn tokenizer(&self) -> &CharWbTokenizer {
        &self.tokenizer
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &IdfWeights {
        &self.idf
    }

    pub fn norm_order(&self) -> NormOrder {
        self.norm_order
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Weight raw counts by IDF and L2-normalize. Terms outside `vocabulary` are
/// dropped.
pub fn encode(counts: &TermCounts, vocabulary: &Vocabulary, idf: &IdfWeights) -> FeatureVector {
    let entries = counts
        .iter()
        .filter_map(|(term, count)| {
            vocabulary
                .get(term)
                .map(|index| (index, f64::from(count) * idf.get(index)))
        })
        .collect();

    let mut vector = FeatureVector::from_entries(entries);
    vector.l2_normalize();
    vector
}

fn count_all<S>(tokenizer: &CharWbTokenizer, documents: &[S]) -> Vec<TermCounts>
where
    S: AsRef<str> + Sync,
{
    documents
        .par_iter()
        .map(|document| TermCounts::from_tokens(tokenizer.tokenize(document.as_ref())))
        .collect()
}
