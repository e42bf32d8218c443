//! Sparse feature vectors.

/// A sparse vector keyed by vocabulary index.
///
/// Entries are kept sorted by index. Every reduction (norm, dot product)
/// accumulates in that order, which makes results bit-for-bit reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Create an empty (zero) vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vector from `(index, value)` pairs. Pairs are sorted by index;
    /// indices must be unique.
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_unstable_by_key(|&(index, _)| index);
        debug_assert!(
            entries.windows(2).all(|pair| pair[0].0 != pair[1].0),
            "duplicate feature index"
        );
        Self { entries }
    }

    /// Value at `index` (0 when absent).
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// True when every component is zero.
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&(_, value)| value == 0.0)
    }

    /// Iterate over `(index, value)` in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, value)| value * value)
            .sum::<f64>()
            .sqrt()
    }

    /// Scale to unit Euclidean norm. A zero vector is left unchanged.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 {
            return;
        }
        for (_, value) in &mut self.entries {
            *value /= norm;
        }
    }

    /// Dot product with a dense weight vector indexed the same way.
    ///
    /// Indices past the end of `weights` contribute nothing.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(index, value)| value * weights.get(index).copied().unwrap_or(0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_sorted() {
        let vector = FeatureVector::from_entries(vec![(4, 1.0), (1, 2.0), (3, 0.5)]);
        let indices: Vec<usize> = vector.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 3, 4]);
        assert_eq!(vector.get(3), 0.5);
        assert_eq!(vector.get(2), 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut vector = FeatureVector::from_entries(vec![(0, 3.0), (1, 4.0)]);
        assert_eq!(vector.norm(), 5.0);
        vector.l2_normalize();
        assert!((vector.norm() - 1.0).abs() < 1e-12);
        assert!((vector.get(0) - 0.6).abs() < 1e-12);
        assert!((vector.get(1) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_normalize_is_noop() {
        let mut vector = FeatureVector::new();
        vector.l2_normalize();
        assert!(vector.is_zero());
        assert_eq!(vector.norm(), 0.0);
        assert_eq!(vector.dot(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_dot() {
        let vector = FeatureVector::from_entries(vec![(0, 1.0), (2, 2.0), (9, 5.0)]);
        assert_eq!(vector.dot(&[0.5, 100.0, -1.0]), 0.5 - 2.0);
    }
}
