use std::iter::FusedIterator;

use crate::array::ArrayIndices;
use crate::array_subset::ArraySubset;

/// An iterator over the indices of elements within an array subset.
///
/// Iterates in row-major order (c-order, last dimension varies fastest).
///
/// For example, the indices of the subset `[1..3, 5..7]` are
/// `[1, 5]`, `[1, 6]`, `[2, 5]`, `[2, 6]`.
pub struct IndicesIterator {
    subset_rev: ArraySubset,
    index: u64,
    num_elements: u64,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(mut subset: ArraySubset) -> Self {
        let num_elements = subset.num_elements();
        subset.start.reverse();
        subset.shape.reverse();
        Self {
            subset_rev: subset,
            index: 0,
            num_elements,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_elements {
            return None;
        }
        let mut current = self.index;
        let mut indices = vec![0u64; self.subset_rev.dimensionality()];
        for (out, (&start, &size)) in std::iter::zip(
            indices.iter_mut().rev(),
            std::iter::zip(&self.subset_rev.start, &self.subset_rev.shape),
        ) {
            *out = current % size + start;
            current /= size;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let num = usize::try_from(self.num_elements - self.index).unwrap_or(usize::MAX);
        (num, Some(num))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}
