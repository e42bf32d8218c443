//! Multiset of n-grams produced from one URL.

use ahash::AHashMap;

use crate::analysis::token::TokenStream;

/// Raw term counts for one document.
///
/// Iteration order is unspecified; consumers that need a stable order map
/// terms to vocabulary indices and sort by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermCounts {
    counts: AHashMap<String, u32>,
    total: u64,
}

impl TermCounts {
    /// Create an empty multiset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token in the stream.
    pub fn from_tokens(tokens: TokenStream) -> Self {
        let mut counts = Self::new();
        for token in tokens {
            counts.add(token.text);
        }
        counts
    }

    /// Add one occurrence of `term`.
    pub fn add(&mut self, term: String) {
        *self.counts.entry(term).or_insert(0) += 1;
        self.total += 1;
    }

    /// Occurrences of `term` (0 when absent).
    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total number of occurrences.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(term, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }
}
