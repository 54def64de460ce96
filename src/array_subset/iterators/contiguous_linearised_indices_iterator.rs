use std::iter::FusedIterator;

use itertools::izip;

use crate::array::ravel_indices;
use crate::array_subset::{ArraySubset, IncompatibleArraySubsetAndShapeError};

use super::IndicesIterator;

/// An iterator over the linearised indices and lengths of contiguous element
/// runs within an array subset.
///
/// Iterates in row-major order (c-order, last dimension varies fastest).
///
/// For example, consider a 4x4 array with the subset `[1..3, 1..3]`.
/// The linearised element indices of the subset are `5, 6, 9, 10`, so this
/// iterator returns `(5, 2)` and `(9, 2)`.
pub struct ContiguousLinearisedIndicesIterator<'a> {
    inner: IndicesIterator,
    array_shape: &'a [u64],
    contiguous_elements: u64,
}

impl<'a> ContiguousLinearisedIndicesIterator<'a> {
    /// Create a new contiguous linearised indices iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(
        subset: &ArraySubset,
        array_shape: &'a [u64],
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if !subset.inbounds(array_shape) {
            return Err(IncompatibleArraySubsetAndShapeError::new(
                subset.clone(),
                array_shape.to_vec(),
            ));
        }

        // Collapse trailing dimensions spanning the full array extent into one
        // contiguous run.
        let mut contiguous = true;
        let mut contiguous_elements = 1;
        let mut shape_out = vec![0u64; subset.dimensionality()];
        for (&subset_start, &subset_size, &array_size, shape_out_i) in izip!(
            subset.start().iter().rev(),
            subset.shape().iter().rev(),
            array_shape.iter().rev(),
            shape_out.iter_mut().rev(),
        ) {
            if contiguous {
                contiguous_elements *= subset_size;
                *shape_out_i = 1;
                contiguous = subset_start == 0 && subset_size == array_size;
            } else {
                *shape_out_i = subset_size;
            }
        }

        let run_starts = ArraySubset {
            start: subset.start().to_vec(),
            shape: shape_out,
        };
        Ok(Self {
            inner: IndicesIterator::new(run_starts),
            array_shape,
            contiguous_elements,
        })
    }

    /// Return the number of contiguous elements per run.
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }
}

impl Iterator for ContiguousLinearisedIndicesIterator<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|indices| (ravel_indices(&indices, self.array_shape), self.contiguous_elements))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator<'_> {}

impl FusedIterator for ContiguousLinearisedIndicesIterator<'_> {}
