use std::iter::FusedIterator;
use std::num::NonZeroU64;

use crate::array::ArrayIndices;
use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};

use super::IndicesIterator;

/// An iterator over the chunks intersecting an array subset.
///
/// Iterates over chunk indices in row-major order (c-order, last dimension
/// varies fastest), yielding `(chunk_indices, chunk_subset)` where
/// `chunk_subset` is the full extent of the chunk in the array coordinate
/// system.
///
/// For example, consider a subset `[1..5, 1..5]` with chunk shape `[2, 2]`.
/// The first item is `([0, 0], ArraySubset{[0..2, 0..2]})`.
pub struct ChunksIterator {
    inner: IndicesIterator,
    chunk_shape: Vec<u64>,
}

impl ChunksIterator {
    /// Create a new chunks iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the subset dimensionality.
    pub fn new(
        subset: &ArraySubset,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if chunk_shape.len() != subset.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                subset.dimensionality(),
            ));
        }
        let chunk_shape: Vec<u64> = chunk_shape.iter().map(|size| size.get()).collect();
        let chunks = if subset.is_empty() {
            ArraySubset {
                start: vec![0; subset.dimensionality()],
                shape: vec![0; subset.dimensionality()],
            }
        } else {
            let chunk_start: ArrayIndices = std::iter::zip(subset.start(), &chunk_shape)
                .map(|(&index, &size)| index / size)
                .collect();
            let chunk_end_inc: ArrayIndices = std::iter::zip(subset.end_inc(), &chunk_shape)
                .map(|(index, &size)| index / size)
                .collect();
            ArraySubset::new_with_start_end_inc(chunk_start, &chunk_end_inc)?
        };
        Ok(Self {
            inner: IndicesIterator::new(chunks),
            chunk_shape,
        })
    }
}

impl Iterator for ChunksIterator {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|chunk_indices| {
            let start = std::iter::zip(&chunk_indices, &self.chunk_shape)
                .map(|(&index, &size)| index * size)
                .collect();
            let chunk_subset = ArraySubset {
                start,
                shape: self.chunk_shape.clone(),
            };
            (chunk_indices, chunk_subset)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunksIterator {}

impl FusedIterator for ChunksIterator {}
