//! Vocabulary construction and lookup.
//!
//! A [`Vocabulary`] maps each selected n-gram to a contiguous index
//! `0..len()`. The [`VocabularyBuilder`] selects the n-grams from a training
//! corpus: rank by corpus-wide frequency, break ties by ascending
//! lexicographic order, keep the top `max_features`, then assign indices.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::term_counts::TermCounts;
use crate::error::{PhishBlockError, Result};

/// Frequency used to rank candidate terms when truncating to `max_features`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMeasure {
    /// Number of documents containing the term at least once.
    #[default]
    DocumentFrequency,
    /// Total occurrences of the term across the corpus.
    TermFrequency,
}

/// How indices are assigned to the selected terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrder {
    /// Ascending lexicographic order of the terms.
    #[default]
    Lexicographic,
    /// Ranking order: most frequent term gets index 0.
    FrequencyRank,
}

/// Term to index mapping with contiguous indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Vocabulary {
    /// Assign indices `0..n` to `terms` in iteration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a term appears twice.
    pub fn from_terms<I>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut vocabulary = Self::default();
        for term in terms {
            if vocabulary.index.contains_key(&term) {
                return Err(PhishBlockError::invalid_argument(format!(
                    "duplicate vocabulary term {term:?}"
                )));
            }
            vocabulary.push(term);
        }
        Ok(vocabulary)
    }

    /// Rebuild a vocabulary from an exported `term -> index` map.
    ///
    /// # Errors
    ///
    /// Returns a schema error unless the indices are exactly `0..n` with no
    /// gaps or duplicates.
    pub fn from_index_map<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let entries: Vec<(String, usize)> = entries.into_iter().collect();
        let size = entries.len();
        let mut slots: Vec<Option<String>> = vec![None; size];

        for (term, index) in entries {
            let slot = slots.get_mut(index).ok_or_else(|| {
                PhishBlockError::schema(format!(
                    "vocabulary index {index} for {term:?} is out of range 0..{size}"
                ))
            })?;
            if let Some(existing) = slot {
                return Err(PhishBlockError::schema(format!(
                    "vocabulary index {index} assigned to both {existing:?} and {term:?}"
                )));
            }
            *slot = Some(term);
        }

        // With `size` entries and no duplicate or out-of-range index every
        // slot is filled.
        let mut vocabulary = Self::default();
        for term in slots.into_iter().flatten() {
            vocabulary.push(term);
        }
        Ok(vocabulary)
    }

    fn push(&mut self, term: String) {
        let index = self.terms.len();
        self.index.insert(term.clone(), index);
        self.terms.push(term);
    }

    /// Index of `term`, if it is in the vocabulary.
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Term stored at `index`.
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over `(term, index)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(index, term)| (term.as_str(), index))
    }

    /// Sorted `term -> index` map for export.
    pub fn to_index_map(&self) -> BTreeMap<String, usize> {
        self.iter()
            .map(|(term, index)| (term.to_string(), index))
            .collect()
    }
}

/// Builds a [`Vocabulary`] from per-document term counts.
#[derive(Clone, Debug, Default)]
pub struct VocabularyBuilder {
    max_features: Option<usize>,
    measure: FrequencyMeasure,
    order: IndexOrder,
}

impl VocabularyBuilder {
    /// Keep at most `max_features` terms.
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: Some(max_features),
            ..Default::default()
        }
    }

    /// Keep every observed term.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_measure(mut self, measure: FrequencyMeasure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_index_order(mut self, order: IndexOrder) -> Self {
        self.order = order;
        self
    }

    /// Select terms from `documents` and assign indices.
    pub fn build(&self, documents: &[TermCounts]) -> Vocabulary {
        // term -> (document frequency, term frequency)
        let mut stats: AHashMap<&str, (u64, u64)> = AHashMap::new();
        for document in documents {
            for (term, count) in document.iter() {
                let entry = stats.entry(term).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(count);
            }
        }

        let mut ranked: Vec<(&str, u64)> = stats
            .into_iter()
            .map(|(term, (df, tf))| {
                let frequency = match self.measure {
                    FrequencyMeasure::DocumentFrequency => df,
                    FrequencyMeasure::TermFrequency => tf,
                };
                (term, frequency)
            })
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        if let Some(limit) = self.max_features {
            ranked.truncate(limit);
        }

        let mut terms: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        if self.order == IndexOrder::Lexicographic {
            terms.sort_unstable();
        }

        let mut vocabulary = Vocabulary::default();
        for term in terms {
            vocabulary.push(term.to_string());
        }
        vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(terms: &[&str]) -> TermCounts {
        let mut counts = TermCounts::new();
        for term in terms {
            counts.add(term.to_string());
        }
        counts
    }

    #[test]
    fn test_keeps_all_when_under_limit() {
        let docs = vec![doc(&["b", "a"]), doc(&["c"])];
        let vocabulary = VocabularyBuilder::new(10).build(&docs);
        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.get("a"), Some(0));
        assert_eq!(vocabulary.get("b"), Some(1));
        assert_eq!(vocabulary.get("c"), Some(2));
    }

    #[test]
    fn test_truncates_by_document_frequency() {
        // "x" appears in every document, "y" twice in one, "z" in two.
        let docs = vec![doc(&["x", "y", "y", "y"]), doc(&["x", "z"]), doc(&["x", "z"])];
        let vocabulary = VocabularyBuilder::new(2).build(&docs);
        assert_eq!(vocabulary.len(), 2);
        assert!(vocabulary.contains("x"));
        assert!(vocabulary.contains("z"));
        assert!(!vocabulary.contains("y"));
    }

    #[test]
    fn test_truncates_by_term_frequency() {
        let docs = vec![doc(&["x", "y", "y", "y"]), doc(&["x", "z"]), doc(&["x", "z"])];
        let vocabulary = VocabularyBuilder::new(2)
            .with_measure(FrequencyMeasure::TermFrequency)
            .build(&docs);
        assert!(vocabulary.contains("x"));
        assert!(vocabulary.contains("y"));
        assert!(!vocabulary.contains("z"));
    }

    #[test]
    fn test_ties_broken_lexicographically() {
        let docs = vec![doc(&["delta", "alpha", "charlie", "bravo"])];
        let vocabulary = VocabularyBuilder::new(2).build(&docs);
        assert_eq!(vocabulary.term(0), Some("alpha"));
        assert_eq!(vocabulary.term(1), Some("bravo"));
    }

    #[test]
    fn test_frequency_rank_order() {
        let docs = vec![doc(&["a", "b"]), doc(&["b"])];
        let vocabulary = VocabularyBuilder::unlimited()
            .with_index_order(IndexOrder::FrequencyRank)
            .build(&docs);
        assert_eq!(vocabulary.term(0), Some("b"));
        assert_eq!(vocabulary.term(1), Some("a"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let docs: Vec<TermCounts> = (0..20)
            .map(|i| doc(&[&format!("t{}", i % 7), &format!("u{}", i % 3), "common"]))
            .collect();
        let first = VocabularyBuilder::new(5).build(&docs);
        for _ in 0..5 {
            assert_eq!(VocabularyBuilder::new(5).build(&docs), first);
        }
    }

    #[test]
    fn test_from_index_map_validates() {
        let ok = Vocabulary::from_index_map(vec![("b".to_string(), 1), ("a".to_string(), 0)]);
        let ok = ok.unwrap();
        assert_eq!(ok.term(0), Some("a"));
        assert_eq!(ok.term(1), Some("b"));

        let gap = Vocabulary::from_index_map(vec![("a".to_string(), 0), ("b".to_string(), 2)]);
        assert!(matches!(gap, Err(PhishBlockError::Schema(_))));

        let dup = Vocabulary::from_index_map(vec![("a".to_string(), 0), ("b".to_string(), 0)]);
        assert!(matches!(dup, Err(PhishBlockError::Schema(_))));
    }

    #[test]
    fn test_from_terms_rejects_duplicates() {
        assert!(Vocabulary::from_terms(vec!["a".to_string(), "a".to_string()]).is_err());
        let vocabulary = Vocabulary::from_terms(vec!["goo".to_string(), "ogl".to_string()]).unwrap();
        assert_eq!(vocabulary.get("ogl"), Some(1));
    }
}
